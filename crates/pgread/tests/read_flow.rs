use pgread::{
    Op, QueryOutput, ReadRequest, ReadResult, Reader, ResultSet, ReturnType, Session,
    Sql, Value,
};
use std::sync::Mutex;
use tokio_postgres::types::ToSql;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Execute { sql: String, params: usize },
    Fetch { sql: String, params: usize },
    Describe { sql: String },
}

/// In-memory session that records every round trip and answers from canned data.
#[derive(Default)]
struct RecordingSession {
    table_columns: Vec<String>,
    result: ResultSet,
    calls: Mutex<Vec<Call>>,
}

impl RecordingSession {
    fn new(table_columns: &[&str], result: ResultSet) -> Self {
        Self {
            table_columns: table_columns.iter().map(|c| c.to_string()).collect(),
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Session for RecordingSession {
    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ReadResult<u64> {
        self.record(Call::Execute {
            sql: sql.to_string(),
            params: params.len(),
        });
        Ok(0)
    }

    async fn fetch(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> ReadResult<ResultSet> {
        self.record(Call::Fetch {
            sql: sql.to_string(),
            params: params.len(),
        });
        Ok(self.result.clone())
    }

    async fn describe(&self, sql: &str) -> ReadResult<Vec<String>> {
        self.record(Call::Describe {
            sql: sql.to_string(),
        });
        Ok(self.table_columns.clone())
    }
}

fn film_list_result() -> ResultSet {
    // The server labels the aggregate column "sum".
    ResultSet::new(
        vec!["category".into(), "sum".into()],
        vec![
            vec![Value::from("Sports"), Value::Int(231)],
            vec![Value::from("Drama"), Value::Int(198)],
        ],
    )
}

fn film_list_request() -> ReadRequest {
    ReadRequest::new("public", "film_list")
        .columns(["category", "price"])
        .aggregate("price", "SUM")
        .condition("length", Op::Gt, 60_i32)
        .order_by(("price", "DESC"))
        .group_by(["category", "price"])
        .limit(10)
}

#[tokio::test]
async fn film_list_scenario_runs_one_statement() {
    let session = RecordingSession::new(&[], film_list_result());
    let reader = Reader::with_return_type("frame").unwrap();

    let out = reader.read(&session, &film_list_request()).await.unwrap();

    assert_eq!(
        session.calls(),
        vec![Call::Fetch {
            sql: "SELECT category, SUM(price) FROM public.film_list WHERE length > $1 \
                  GROUP BY category, price ORDER BY price DESC LIMIT $2"
                .to_string(),
            params: 2,
        }]
    );

    let frame = out.as_frame().unwrap();
    assert_eq!(frame.columns, vec!["category", "sum: price"]);
    assert_eq!(frame.rows.len(), 2);
}

#[tokio::test]
async fn records_are_keyed_by_selected_columns() {
    let session = RecordingSession::new(&[], film_list_result());
    let out = Reader::new()
        .read(&session, &film_list_request())
        .await
        .unwrap();

    let records = out.as_records().unwrap();
    assert_eq!(records[&0].get("price"), Some(&Value::Int(231)));
    assert_eq!(records[&1].get("category"), Some(&Value::from("Drama")));
}

#[tokio::test]
async fn request_return_type_overrides_reader_default() {
    let session = RecordingSession::new(&[], film_list_result());
    let out = Reader::new()
        .read(&session, &film_list_request().return_type("list"))
        .await
        .unwrap();
    assert_eq!(out.return_type(), ReturnType::Rows);
    assert_eq!(out.as_rows().unwrap(), film_list_result().rows.as_slice());
}

#[tokio::test]
async fn missing_columns_are_resolved_with_a_probe() {
    let result = ResultSet::new(
        vec!["actor_id".into(), "first_name".into()],
        vec![vec![Value::Int(1), Value::from("Penelope")]],
    );
    let session = RecordingSession::new(&["actor_id", "first_name"], result);

    let plan = Reader::new()
        .plan(&session, &ReadRequest::new("public", "actor").limit(1))
        .await
        .unwrap();

    assert_eq!(
        session.calls(),
        vec![Call::Describe {
            sql: "SELECT * FROM public.actor LIMIT 1".to_string()
        }]
    );
    let names: Vec<_> = plan.columns().iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["actor_id", "first_name"]);
    assert_eq!(plan.sql(), "SELECT actor_id, first_name FROM public.actor LIMIT $1");
}

#[tokio::test]
async fn resolved_columns_missing_an_aggregate_key_fail_before_fetch() {
    let session = RecordingSession::new(&["category"], ResultSet::default());
    let err = Reader::new()
        .read(
            &session,
            &ReadRequest::new("public", "film_list")
                .aggregate("price", "SUM")
                .group_by(["category"]),
        )
        .await
        .unwrap_err();

    assert!(err.is_constraint(), "{err}");
    assert!(
        session
            .calls()
            .iter()
            .all(|c| matches!(c, Call::Describe { .. }))
    );
}

#[tokio::test]
async fn validation_errors_never_reach_the_session() {
    let session = RecordingSession::default();
    let reader = Reader::new();

    // (request, expect a constraint error rather than a validation error)
    let cases = vec![
        (
            ReadRequest::new("public", "film_list")
                .columns(["price"])
                .aggregate("price", "SUM"),
            true,
        ),
        (
            ReadRequest::new("public", "film_list").conjunction("AND 1=1"),
            false,
        ),
        (
            ReadRequest::new("public", "film_list").order_by(("price", "UP")),
            false,
        ),
        (
            ReadRequest::new("public", "film_list")
                .condition_list("id", "IN", [1_i64, 2])
                .condition("id", "BETWEEN", 3_i64),
            false,
        ),
    ];

    for (request, constraint) in cases {
        let err = reader.read(&session, &request).await.unwrap_err();
        if constraint {
            assert!(err.is_constraint(), "{err}");
        } else {
            assert!(err.is_validation(), "{err}");
        }
    }
    assert!(session.calls().is_empty());
}

#[tokio::test]
async fn raw_select_is_fetched_and_formatted() {
    let result = ResultSet::new(vec!["count".into()], vec![vec![Value::Int(200)]]);
    let session = RecordingSession::new(&[], result);

    let out = Reader::with_return_type("dict")
        .unwrap()
        .query(&session, "SELECT count(*) FROM public.actor", true)
        .await
        .unwrap()
        .unwrap();

    let QueryOutput::Records(records) = out else {
        panic!("expected records");
    };
    assert_eq!(records[&0].get("count"), Some(&Value::Int(200)));
}

#[tokio::test]
async fn raw_select_with_bound_values() {
    let session = RecordingSession::new(&[], ResultSet::default());
    let mut sql = Sql::new("SELECT title FROM public.film WHERE length > ");
    sql.push_bind(120_i32);

    let out = Reader::new().query(&session, sql, false).await.unwrap();

    assert!(out.is_none());
    assert_eq!(
        session.calls(),
        vec![Call::Execute {
            sql: "SELECT title FROM public.film WHERE length > $1".to_string(),
            params: 1,
        }]
    );
}

#[tokio::test]
async fn raw_writes_and_blank_statements_are_rejected() {
    let session = RecordingSession::default();
    let reader = Reader::new();

    let err = reader.query(&session, "UPDATE t SET x=1", false).await.unwrap_err();
    assert!(err.is_query_constraint());

    let err = reader.query(&session, "", true).await.unwrap_err();
    assert_eq!(err.field(), Some("query"));

    assert!(session.calls().is_empty());
}
