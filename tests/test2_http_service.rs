use n1ql_middleware::prelude::*;
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serve exactly one HTTP request with a canned JSON body, handing back the request body.
async fn one_shot_service(status: u16, body: Value) -> (u16, oneshot::Receiver<Value>) {
    one_shot_raw(status, body.to_string()).await
}

/// Like [`one_shot_service`], but the payload is written verbatim.
async fn one_shot_raw(status: u16, payload: String) -> (u16, oneshot::Receiver<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let (header_end, content_length) = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client hung up before sending a request");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..pos]).to_ascii_lowercase();
                let len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .map_or(0, |v| v.trim().parse::<usize>().unwrap());
                break (pos + 4, len);
            }
        };
        while buf.len() < header_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
        }
        let request: Value = serde_json::from_slice(&buf[header_end..header_end + content_length]).unwrap();
        let _ = tx.send(request);

        let response = format!(
            "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
            payload.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    (port, rx)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn local_connection(port: u16) -> Connection {
    let conn_str: ConnectionString = "couchbase://127.0.0.1/mybucket".parse().unwrap();
    let opts = CouchbaseOptions::builder().query_port(port).finish();
    Connection::open(&conn_str, &opts).unwrap()
}

#[tokio::test]
async fn posts_statement_and_args() -> Result<(), N1qlMiddlewareDbError> {
    init_tracing();
    let (port, request) = one_shot_service(
        200,
        json!({
            "requestID": "r-1",
            "results": [{"id": "x"}],
            "status": "success",
            "metrics": {"elapsedTime": "2ms", "executionTime": "1ms", "resultCount": 1, "resultSize": 10}
        }),
    )
    .await;

    let conn = local_connection(port);
    let mut cursor = conn.cursor()?;
    cursor
        .execute(
            "SELECT * FROM mybucket WHERE id = $1 AND n = $2",
            &[RowValues::Text("x".into()), RowValues::Int(2)],
        )
        .await?;

    let result = cursor.fetch_all()?;
    assert_eq!(result.request_id, "r-1");
    assert_eq!(result.status, "success");
    assert_eq!(result.rows, vec![json!({"id": "x"})]);
    assert_eq!(cursor.fetch_one()?, &json!({"id": "x"}));

    let sent = request.await.unwrap();
    assert_eq!(
        sent,
        json!({
            "statement": "SELECT * FROM mybucket WHERE id = $1 AND n = $2",
            "args": ["x", 2]
        })
    );
    Ok(())
}

#[tokio::test]
async fn service_errors_are_classified() -> Result<(), N1qlMiddlewareDbError> {
    let (port, _request) = one_shot_service(
        400,
        json!({
            "requestID": "r-2",
            "errors": [{"code": 3000, "msg": "syntax error - at FORM"}],
            "status": "fatal"
        }),
    )
    .await;

    let conn = local_connection(port);
    let mut cursor = conn.cursor()?;
    let err = cursor.execute("SELECT * FORM mybucket", &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Programming);
    assert!(err.to_string().contains("[3000]"));
    Ok(())
}

#[tokio::test]
async fn undecodable_success_body_is_interface_error() -> Result<(), N1qlMiddlewareDbError> {
    let (port, _request) = one_shot_raw(200, "<html>not json</html>".to_string()).await;

    let conn = local_connection(port);
    let mut cursor = conn.cursor()?;
    let err = cursor.execute("SELECT 1", &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Interface);
    assert_eq!(cursor.fetch_all().unwrap_err().kind(), ErrorKind::Interface);
    Ok(())
}

#[tokio::test]
async fn errors_in_success_response_are_raised() -> Result<(), N1qlMiddlewareDbError> {
    let (port, _request) = one_shot_service(
        200,
        json!({
            "requestID": "r-3",
            "results": [],
            "errors": [
                {"code": 12009, "msg": "DML Error, possible causes include CAS mismatch or Duplicate Key"},
                {"code": 5000, "msg": "statement aborted"}
            ],
            "status": "errors"
        }),
    )
    .await;

    let conn = local_connection(port);
    let mut cursor = conn.cursor()?;
    let err = cursor
        .execute("INSERT INTO mybucket (KEY, VALUE) VALUES ($1, $2)", &["k1".into(), RowValues::Int(1)])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Integrity);
    let text = err.to_string();
    assert!(text.contains("[12009]"), "{text}");
    assert!(text.contains("[5000] statement aborted"), "{text}");
    Ok(())
}

#[tokio::test]
async fn non_json_failure_is_operational() -> Result<(), N1qlMiddlewareDbError> {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut chunk = [0u8; 4096];
        let _ = socket.read(&mut chunk).await;
        let body = "service unavailable";
        let response = format!(
            "HTTP/1.1 503 X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = socket.write_all(response.as_bytes()).await;
    });

    let conn = local_connection(port);
    let mut cursor = conn.cursor()?;
    let err = cursor.execute("SELECT 1", &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Operational);
    assert!(err.to_string().contains("503"));
    Ok(())
}

#[tokio::test]
async fn unreachable_host_is_operational() -> Result<(), N1qlMiddlewareDbError> {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };

    let conn = local_connection(port);
    let mut cursor = conn.cursor()?;
    let err = cursor.execute("SELECT 1", &[]).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Operational);
    Ok(())
}

#[tokio::test]
async fn closed_connection_cannot_query() -> Result<(), N1qlMiddlewareDbError> {
    let mut conn = local_connection(1);
    conn.close().await?;
    assert!(conn.is_closed());
    assert_eq!(conn.cursor().unwrap_err().kind(), ErrorKind::Interface);
    Ok(())
}
