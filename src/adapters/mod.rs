pub mod api;
pub mod keco_http;
pub mod keco_replay;
