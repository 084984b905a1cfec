//! Declarative reads against a real database.
//!
//! Run with: cargo run --example read_demo -p pgread
//!
//! Connection settings come from a .env file or the environment:
//! DB_HOST, DB_NAME, DB_USER, DB_PASSWORD, and optionally DB_PORT.
//! Set RUST_LOG=pgread=debug to see every statement sent.

use colored::Colorize;
use pgread::{Connection, ConnectionParams, Op, ReadError, ReadRequest, Reader};
use std::env;
use tracing_subscriber::EnvFilter;

fn print_header(title: &str) {
    println!();
    println!("{}", "─".repeat(70).bright_black());
    println!("{}", title.bold().cyan());
    println!("{}", "─".repeat(70).bright_black());
}

fn print_info(msg: &str) {
    println!("  {} {}", "ℹ".blue(), msg);
}

fn params_from_env() -> ConnectionParams {
    let mut params = ConnectionParams::new();
    if let Ok(host) = env::var("DB_HOST") {
        params = params.host(host);
    }
    if let Ok(database) = env::var("DB_NAME") {
        params = params.database(database);
    }
    if let Ok(user) = env::var("DB_USER") {
        params = params.user(user);
    }
    if let Ok(password) = env::var("DB_PASSWORD") {
        params = params.password(password);
    }
    if let Some(port) = env::var("DB_PORT").ok().and_then(|p| p.parse().ok()) {
        params = params.port(port);
    }
    params
}

#[tokio::main]
async fn main() -> Result<(), ReadError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let params = params_from_env();
    print_info(&format!("connecting with {params:?}"));
    let conn = Connection::open(&params).await?;

    // ============================================
    // Aggregated read, shown as a table
    // ============================================
    print_header("SUM(price) per category for films over an hour");

    let reader = Reader::with_return_type("frame")?;
    let request = ReadRequest::new("public", "film_list")
        .columns(["category", "price"])
        .aggregate("price", "SUM")
        .condition("length", Op::Gt, 60_i32)
        .order_by(("price", "DESC"))
        .group_by(["category", "price"])
        .limit(10);

    let plan = reader.plan(&conn, &request).await?;
    print_info(&format!("statement: {}", plan.sql().yellow()));
    let out = reader.run(&conn, &plan).await?;
    if let Some(frame) = out.as_frame() {
        println!("{frame}");
    }

    // ============================================
    // Columns resolved from the table
    // ============================================
    print_header("First three actors, every column, as records");

    let out = Reader::new()
        .read(
            &conn,
            &ReadRequest::new("public", "actor")
                .order_by("actor_id")
                .limit(3),
        )
        .await?;
    if let Some(records) = out.as_records() {
        for (i, record) in records {
            let cells: Vec<String> = record.iter().map(|(c, v)| format!("{c}={v}")).collect();
            println!("  {} {}", format!("{i}:").green(), cells.join(", "));
        }
    }

    // ============================================
    // Raw statements
    // ============================================
    print_header("Raw statements go through the read-only gate");

    let out = Reader::with_return_type("list")?
        .query(&conn, "SELECT count(*) FROM public.film", true)
        .await?;
    if let Some(rows) = out.as_ref().and_then(|o| o.as_rows()) {
        print_info(&format!("films: {}", rows[0][0]));
    }

    match reader.query(&conn, "DELETE FROM public.film", false).await {
        Err(err) if err.is_query_constraint() => {
            println!("  {} {}", "✗".red().bold(), err);
        }
        other => {
            println!("  {} unexpected: {other:?}", "!".yellow());
        }
    }

    conn.close().await;
    Ok(())
}
