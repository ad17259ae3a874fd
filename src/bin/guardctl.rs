use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, RequestBuilder};

#[derive(Parser)]
#[command(name = "guardctl")]
#[command(about = "Control CLI for the guardd daemon", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:817")]
    url: String,

    /// Bearer token; omit to call as an anonymous user.
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shut the daemon down
    Shutdown,
    /// Restart the daemon
    Restart,
    /// Print the debug report
    Debug {
        /// Formatting style ("github" for GitHub-flavored markdown)
        #[arg(short, long, default_value = "")]
        style: String,
    },
    /// List registered API endpoints
    Endpoints,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", key))?,
        );
    }

    let request = |method: Method, path: &str| -> RequestBuilder {
        client
            .request(method, format!("{}/api/v1/{}", cli.url, path))
            .headers(headers.clone())
    };

    let res = match &cli.command {
        Commands::Shutdown => request(Method::POST, "core/shutdown").send().await?,
        Commands::Restart => request(Method::POST, "core/restart").send().await?,
        Commands::Debug { style } => {
            request(Method::GET, "debug/core")
                .query(&[("style", style.as_str())])
                .send()
                .await?
        }
        Commands::Endpoints => {
            let res = request(Method::GET, "endpoints").send().await?;
            if res.status().is_success() {
                let listed: serde_json::Value = res.json().await?;
                println!("{}", serde_json::to_string_pretty(&listed)?);
                return Ok(());
            }
            res
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: control API returned status {}", status);
        eprintln!("Response: {}", text);
        std::process::exit(1);
    }

    println!("{}", text);
    Ok(())
}
