//! HTTP API tests
//!
//! The operations are called directly first, then a real server is started
//! on an ephemeral port and spoken to over raw TCP.

use axum::http::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use stegsuite::config::{AppConfig, EngineConfig};
use stegsuite::server::api::{self, ApiError, CapacityRequest, DecodeForm, EncodeForm, LsbBits};
use stegsuite::server::Server;
use stegsuite::stego::image;
use stegsuite::{KdfParams, PixelBuffer, SecurityLevel};

fn fast_engine() -> EngineConfig {
    EngineConfig {
        kdf: KdfParams::new(64, 1, 1),
        ..EngineConfig::default()
    }
}

fn carrier_png(width: u32, height: u32) -> Vec<u8> {
    let buffer =
        PixelBuffer::from_fn(width, height, 3, |x, y, c| ((x * 3 + y * 2) as u8) ^ (c * 64)).unwrap();
    image::to_png_bytes(&buffer).unwrap()
}

fn carrier_data_url(width: u32, height: u32) -> String {
    let buffer = PixelBuffer::filled(width, height, 3, 128).unwrap();
    image::to_png_data_url(&buffer).unwrap()
}

#[test]
fn test_api_capacity() {
    let request = CapacityRequest {
        image: carrier_data_url(100, 100),
        lsb_bits: Some(LsbBits::Text("1".to_string())),
    };
    let response = api::capacity(&request, &fast_engine()).unwrap();
    assert!(response.success);
    assert_eq!(response.capacity.capacity_bytes, 3709);

    // Default bit depth is 2
    let request = CapacityRequest {
        image: carrier_data_url(100, 100),
        lsb_bits: None,
    };
    let response = api::capacity(&request, &fast_engine()).unwrap();
    assert_eq!(response.capacity.capacity_bytes, 7500 - 41);
}

#[test]
fn test_api_capacity_rejects_bad_input() {
    let request = CapacityRequest {
        image: carrier_data_url(10, 10),
        lsb_bits: Some(LsbBits::Number(9)),
    };
    let err = api::capacity(&request, &fast_engine()).unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);

    let request = CapacityRequest {
        image: "data:image/png;base64,AAAA".to_string(),
        lsb_bits: None,
    };
    let err = api::capacity(&request, &fast_engine()).unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_api_encode_decode_roundtrip() {
    let engine = fast_engine();
    let form = EncodeForm {
        image: carrier_png(64, 64),
        message: "hola mundo".to_string(),
        password: "secreto".to_string(),
        lsb_bits: Some("2".to_string()),
        compression: Some("false".to_string()),
    };
    let encoded = api::encode(&form, &engine).unwrap();
    assert!(encoded.success);
    assert!(encoded.image.starts_with("data:image/png;base64,"));
    assert!((0.0..=1.0).contains(&encoded.security_score));

    let stego_png = image::decode_data_url(&encoded.image).unwrap();
    let form = DecodeForm {
        image: stego_png.clone(),
        password: "secreto".to_string(),
        lsb_bits: Some("2".to_string()),
    };
    assert_eq!(api::decode(&form, &engine).unwrap().message, "hola mundo");

    let form = DecodeForm {
        image: stego_png,
        password: "incorrecto".to_string(),
        lsb_bits: Some("2".to_string()),
    };
    let err = api::decode(&form, &engine).unwrap_err();
    assert!(matches!(err, ApiError::DecodeFailed));
    assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[test]
fn test_api_encode_capacity_error() {
    let form = EncodeForm {
        image: carrier_png(8, 8),
        message: "x".repeat(500),
        password: "pw".to_string(),
        lsb_bits: Some("1".to_string()),
        compression: Some("false".to_string()),
    };
    let err = api::encode(&form, &fast_engine()).unwrap_err();
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_api_analyze() {
    let png = image::to_png_bytes(&PixelBuffer::filled(64, 64, 3, 90).unwrap()).unwrap();
    let response = api::analyze(&png).unwrap();

    assert!(response.success);
    assert_eq!(response.report.security_level, SecurityLevel::High);

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["security_level"], "High");
    assert_eq!(json["detection_risk"], "Low");
    assert!(json["security_score"].is_number());
    assert!(json["recommendation"].is_string());
}

async fn start_server() -> (std::net::SocketAddr, oneshot::Sender<()>) {
    let mut config = AppConfig::default();
    config.engine = fast_engine();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown = async move {
            let _ = rx.await;
        };
        Server::new(&config).serve(listener, shutdown).await.unwrap();
    });

    (addr, tx)
}

async fn send_raw(addr: std::net::SocketAddr, request: Vec<u8>) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(&request).await.unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

fn post(path: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
    let mut request = format!(
        "POST {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n",
        path,
        content_type,
        body.len()
    )
    .into_bytes();
    request.extend_from_slice(body);
    request
}

fn multipart_body(boundary: &str, fields: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        let disposition = if *name == "image" {
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"carrier.png\"\r\nContent-Type: image/png\r\n",
                name
            )
        } else {
            format!("Content-Disposition: form-data; name=\"{}\"\r\n", name)
        };
        body.extend_from_slice(format!("--{}\r\n{}\r\n", boundary, disposition).as_bytes());
        body.extend_from_slice(value);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    body
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_server_smoke() {
    let (addr, shutdown) = start_server().await;

    // Health check
    let response = send_raw(
        addr,
        b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n".to_vec(),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.ends_with("OK"));

    // Capacity with lsb_bits as a string, the way browsers send it
    let body = serde_json::json!({ "image": carrier_data_url(100, 100), "lsb_bits": "1" });
    let response = send_raw(
        addr,
        post("/api/capacity", "application/json", body.to_string().as_bytes()),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.contains("\"capacity_bytes\":3709"), "{}", response);

    // Error shape
    let body = serde_json::json!({ "image": carrier_data_url(10, 10), "lsb_bits": 0 });
    let response = send_raw(
        addr,
        post("/api/capacity", "application/json", body.to_string().as_bytes()),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 400"), "{}", response);
    assert!(response.contains("\"success\":false"), "{}", response);

    // Multipart analyze
    let boundary = "stegsuiteboundary";
    let png = carrier_png(40, 40);
    let body = multipart_body(boundary, &[("image", png.as_slice())]);
    let response = send_raw(
        addr,
        post(
            "/api/analyze",
            &format!("multipart/form-data; boundary={}", boundary),
            &body,
        ),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.contains("\"security_level\""), "{}", response);

    // Multipart encode
    let body = multipart_body(
        boundary,
        &[
            ("image", png.as_slice()),
            ("message", &b"over the wire"[..]),
            ("password", &b"pw"[..]),
            ("lsb_bits", &b"1"[..]),
            ("compression", &b"true"[..]),
        ],
    );
    let response = send_raw(
        addr,
        post(
            "/api/encode",
            &format!("multipart/form-data; boundary={}", boundary),
            &body,
        ),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.contains("data:image/png;base64,"), "{}", response);

    // Multipart decode of a clean image fails with the generic message
    let body = multipart_body(
        boundary,
        &[
            ("image", png.as_slice()),
            ("password", &b"pw"[..]),
            ("lsb_bits", &b"1"[..]),
        ],
    );
    let response = send_raw(
        addr,
        post(
            "/api/decode",
            &format!("multipart/form-data; boundary={}", boundary),
            &body,
        ),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 422"), "{}", response);
    assert!(response.contains("\"success\":false"), "{}", response);

    let _ = shutdown.send(());
}
