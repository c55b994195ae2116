use std::fs;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about = "Write the coffee-shop OpenAPI document to a file", long_about = None)]
struct Args {
    /// Destination file
    #[arg(long, default_value = "/tmp/coffee-shop-openapi.json")]
    out: String,
    /// Port advertised in the `servers` entry
    #[arg(long, default_value_t = 8000)]
    port: u16,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let doc = coffee_shop::docs::build_openapi(args.port)?;
    let s = serde_json::to_string_pretty(&doc)?;
    fs::write(&args.out, s)?;
    println!("wrote {}", args.out);
    Ok(())
}
