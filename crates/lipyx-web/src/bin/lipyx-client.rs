//! Lipyx command-line client.
//!
//! Reads one line of comma-separated SMILES from stdin and asks the server
//! for a prediction for each. The endpoint comes from LIPYX_API_URL.
//!
//! Run with: echo "CCO, c1ccccc1O" | cargo run -p lipyx-web --bin lipyx-client

use std::io::BufRead;

use lipyx_web::handlers::predict::PredictResponse;
use serde_json::json;

const DEFAULT_API_URL: &str = "http://localhost:5000/predict";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let api_url = std::env::var("LIPYX_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    let client = reqwest::Client::new();

    println!("Enter SMILES strings separated by commas for lipophilicity prediction:");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;

    for smiles in split_input(&line) {
        println!("Sending prediction request for: {smiles}");
        if let Err(e) = request_prediction(&client, &api_url, smiles).await {
            println!("Error making request: {e:#}");
        }
    }

    Ok(())
}

/// Comma-separated, trimmed, empty entries dropped.
fn split_input(line: &str) -> Vec<&str> {
    line.split(',').map(str::trim).filter(|s| !s.is_empty()).collect()
}

async fn request_prediction(client: &reqwest::Client, api_url: &str, smiles: &str) -> anyhow::Result<()> {
    let response: PredictResponse = client
        .post(api_url)
        .json(&json!({ "smiles": smiles }))
        .send()
        .await?
        .json()
        .await?;

    for line in report(smiles, &response) {
        println!("{line}");
    }
    Ok(())
}

/// Lines to print for one response. An `error` replaces everything else,
/// even when a prediction came back with it.
fn report(smiles: &str, response: &PredictResponse) -> Vec<String> {
    if let Some(error) = &response.error {
        return vec![format!("Error: {error}")];
    }
    let mut lines = Vec::new();
    if let Some(value) = response.prediction {
        lines.push(format!("Predicted Lipophilicity for '{smiles}': {value:.6}"));
    }
    if let Some(path) = &response.image_path {
        lines.push(format!("Molecule image saved at: {path}"));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims() {
        assert_eq!(split_input(" CCO, c1ccccc1 ,,CC(=O)O\n"), vec!["CCO", "c1ccccc1", "CC(=O)O"]);
        assert!(split_input("\n").is_empty());
    }

    #[test]
    fn error_suppresses_prediction() {
        let response = PredictResponse {
            prediction: Some(1.25),
            image_path: None,
            error: Some("Failed to generate molecule image".into()),
        };
        assert_eq!(report("CCO", &response), vec!["Error: Failed to generate molecule image"]);
    }

    #[test]
    fn success_prints_value_then_path() {
        let response = PredictResponse {
            prediction: Some(1.25),
            image_path: Some("/srv/images/molecule_3.png".into()),
            error: None,
        };
        assert_eq!(
            report("CCO", &response),
            vec![
                "Predicted Lipophilicity for 'CCO': 1.250000",
                "Molecule image saved at: /srv/images/molecule_3.png",
            ]
        );
    }
}
