use std::time::Duration;

use keco_evcharger::adapters::keco_http::{
    DEFAULT_API_BASE, DEFAULT_REQUEST_TIMEOUT_SECONDS, KecoClient, KecoHttpClient,
};
use keco_evcharger::domain::region::{DEFAULT_REGION_CODE, REGIONS, region_name};

fn main() {
    if let Err(error) = run() {
        eprintln!("station search failed: {error}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let _ = dotenvy::dotenv();

    let mut region_code = DEFAULT_REGION_CODE.to_string();
    let mut query = String::new();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--zcode" => {
                let Some(value) = args.get(index + 1) else {
                    return Err("--zcode requires a value".to_string());
                };
                region_code = value.trim().to_string();
                index += 2;
            }
            "--query" => {
                let Some(value) = args.get(index + 1) else {
                    return Err("--query requires a value".to_string());
                };
                query = value.clone();
                index += 2;
            }
            "--list-regions" => {
                for (code, name) in REGIONS {
                    println!("{code}\t{name}");
                }
                return Ok(());
            }
            "--help" | "-h" => {
                println!(
                    "usage: keco_station_search --query <keyword> [--zcode <region>] [--list-regions]"
                );
                return Ok(());
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }

    let Some(region) = region_name(&region_code) else {
        return Err(format!(
            "unknown region code {region_code}; see --list-regions"
        ));
    };
    if query.trim().is_empty() {
        return Err("--query is required".to_string());
    }

    let api_key = std::env::var("KECO_API_KEY")
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| "KECO_API_KEY is required".to_string())?;
    let api_base = std::env::var("KECO_API_BASE")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

    let client = KecoHttpClient::new(
        &api_key,
        &api_base,
        Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECONDS),
    )
    .map_err(|error| error.to_string())?;

    client.validate_credentials().map_err(|error| {
        if error.is_credential() {
            format!("API key was rejected: {error}")
        } else {
            format!("cannot connect: {error}")
        }
    })?;

    let stations = client
        .search_stations(&query, &region_code)
        .map_err(|error| error.to_string())?;

    if stations.is_empty() {
        println!("no stations in {region} match \"{}\"", query.trim());
        return Ok(());
    }

    for station in stations {
        println!(
            "{}|{}|{}|{}",
            station.id, station.name, station.address, station.operator
        );
    }

    Ok(())
}
