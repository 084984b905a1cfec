//! Round trips against a real server. Skipped unless `DATABASE_URL` is set
//! (a `.env` file is honored).

use pgread::{Connection, Op, ReadRequest, ReadResult, Reader, Value};
use rust_decimal::Decimal;

async fn try_connect() -> Option<Connection> {
    let _ = dotenvy::dotenv();
    let database_url = std::env::var("DATABASE_URL").ok()?;
    let conn = Connection::open_url(&database_url)
        .await
        .expect("Failed to connect to DATABASE_URL with NoTls");
    Some(conn)
}

async fn seed(conn: &Connection) {
    conn.client()
        .batch_execute(
            "CREATE TEMP TABLE film_list (
                 title text NOT NULL,
                 category text NOT NULL,
                 price numeric(4, 2) NOT NULL,
                 length int4 NOT NULL
             );
             INSERT INTO film_list VALUES
                 ('A', 'Drama', 2.99, 90),
                 ('B', 'Drama', 2.99, 120),
                 ('C', 'Sports', 4.99, 45),
                 ('D', 'Sports', 0.99, 150);",
        )
        .await
        .expect("seed temp table");
}

#[tokio::test]
async fn aggregate_read_relabels_frame_headers() -> ReadResult<()> {
    let Some(conn) = try_connect().await else {
        eprintln!("DATABASE_URL is not set; skipping aggregate_read_relabels_frame_headers");
        return Ok(());
    };
    seed(&conn).await;

    let reader = Reader::with_return_type("frame")?;
    let out = reader
        .read(
            &conn,
            &ReadRequest::new("pg_temp", "film_list")
                .columns(["category", "price"])
                .aggregate("price", "SUM")
                .condition("length", Op::Gt, 60_i32)
                .group_by(["category", "price"])
                .order_by(("price", "DESC"))
                .limit(10),
        )
        .await?;

    let frame = out.as_frame().expect("frame output");
    assert_eq!(frame.columns, vec!["category", "sum: price"]);
    assert_eq!(
        frame.rows,
        vec![
            vec![Value::from("Drama"), Value::Numeric(Decimal::new(598, 2))],
            vec![Value::from("Sports"), Value::Numeric(Decimal::new(99, 2))],
        ]
    );

    conn.close().await;
    Ok(())
}

#[tokio::test]
async fn columns_are_resolved_in_table_order() -> ReadResult<()> {
    let Some(conn) = try_connect().await else {
        eprintln!("DATABASE_URL is not set; skipping columns_are_resolved_in_table_order");
        return Ok(());
    };
    seed(&conn).await;

    let reader = Reader::new();
    let request = ReadRequest::new("pg_temp", "film_list")
        .condition_list("title", Op::In, ["A", "C"])
        .order_by("title");
    let plan = reader.plan(&conn, &request).await?;
    let names: Vec<_> = plan.columns().iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["title", "category", "price", "length"]);

    let out = reader.run(&conn, &plan).await?;
    let records = out.as_records().expect("records output");
    assert_eq!(records.len(), 2);
    assert_eq!(records[&0].get("title"), Some(&Value::from("A")));
    assert_eq!(records[&1].get("length"), Some(&Value::Int(45)));
    Ok(())
}

#[tokio::test]
async fn server_errors_surface_unchanged() -> ReadResult<()> {
    let Some(conn) = try_connect().await else {
        eprintln!("DATABASE_URL is not set; skipping server_errors_surface_unchanged");
        return Ok(());
    };
    seed(&conn).await;

    let err = Reader::new()
        .read(
            &conn,
            &ReadRequest::new("pg_temp", "film_list")
                .columns(["category", "price", "length"])
                .aggregate("price", "SUM")
                .group_by(["category"]),
        )
        .await
        .unwrap_err();
    assert!(err.is_grouping_error(), "{err}");

    let err = Reader::new()
        .query(&conn, "SELECT 1; DROP TABLE film_list", false)
        .await
        .unwrap_err();
    assert!(err.is_backend(), "{err}");

    // The table survived the stacked statement.
    let out = Reader::with_return_type("list")?
        .query(&conn, "SELECT count(*) FROM film_list", true)
        .await?
        .expect("fetched");
    assert_eq!(out.as_rows().expect("rows")[0], vec![Value::Int(4)]);
    Ok(())
}

#[tokio::test]
async fn enum_and_interval_columns_decode() -> ReadResult<()> {
    let Some(conn) = try_connect().await else {
        eprintln!("DATABASE_URL is not set; skipping enum_and_interval_columns_decode");
        return Ok(());
    };
    conn.client()
        .batch_execute(
            "CREATE TYPE pg_temp.mpaa_rating AS ENUM ('G', 'PG', 'R');
             CREATE TEMP TABLE rated_film (
                 title text NOT NULL,
                 rating pg_temp.mpaa_rating NOT NULL,
                 dur interval NOT NULL
             );
             INSERT INTO rated_film VALUES ('A', 'PG', interval '90 minutes');",
        )
        .await
        .expect("seed temp enum table");

    let out = Reader::new()
        .read(&conn, &ReadRequest::new("pg_temp", "rated_film"))
        .await?;
    let records = out.as_records().expect("records output");
    assert_eq!(records[&0].get("rating"), Some(&Value::from("PG")));

    let mut micros = Vec::new();
    micros.extend_from_slice(&5_400_000_000_i64.to_be_bytes());
    micros.extend_from_slice(&0_i32.to_be_bytes());
    micros.extend_from_slice(&0_i32.to_be_bytes());
    assert_eq!(
        records[&0].get("dur"),
        Some(&Value::Raw {
            type_name: "interval".into(),
            bytes: micros,
        })
    );

    let out = Reader::new()
        .read(
            &conn,
            &ReadRequest::new("pg_temp", "rated_film").columns(["title", "rating"]),
        )
        .await?;
    assert_eq!(
        out.as_records().expect("records output")[&0].get("rating"),
        Some(&Value::from("PG"))
    );
    Ok(())
}
