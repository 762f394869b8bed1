
use std::{collections::HashMap, sync::Arc};

use pretty_assertions::assert_eq;

use crate::{
    callbacks::ClientCertificate,
    client::{LogLevel, ShellSessions, ShellSessionsBuilder},
    sessions::{ClearanceOrder, DEFAULT_CLEARANCE_TIMEOUT_MS},
    trust::{
        certificate_verdict_code, test_support::*, CertificateErrorDecision, CertificateVerdict,
        ClientCertificateSelection, DEFAULT_USER_AGENT,
    },
};

async fn shell(server: StaticServer) -> Arc<ShellSessions> {
    let builder = ShellSessionsBuilder::new();
    builder.set_server(Box::new(server));
    builder.set_log_level(LogLevel::Debug);
    builder.build().await
}

#[test]
fn test_builder_defaults() {
    let builder = ShellSessionsBuilder::new();

    assert_eq!(builder.log_level(), LogLevel::Info);
    assert_eq!(builder.clearance_timeout_ms(), DEFAULT_CLEARANCE_TIMEOUT_MS);
    assert_eq!(builder.shutdown_timeout_ms(), 6000);
    assert_eq!(builder.clearance_order(), ClearanceOrder::DefaultFirst);
    assert_eq!(builder.user_agent(), DEFAULT_USER_AGENT);
}

#[test]
fn test_builder_setters() {
    let builder = ShellSessionsBuilder::new();
    builder.set_log_level(LogLevel::Trace);
    builder.set_clearance_timeout_ms(250);
    builder.set_shutdown_timeout_ms(1000);
    builder.set_clearance_order(ClearanceOrder::WebviewFirst);
    builder.set_user_agent("R2-test".to_owned());

    assert_eq!(builder.log_level(), LogLevel::Trace);
    assert_eq!(builder.clearance_timeout_ms(), 250);
    assert_eq!(builder.shutdown_timeout_ms(), 1000);
    assert_eq!(builder.clearance_order(), ClearanceOrder::WebviewFirst);
    assert_eq!(builder.user_agent(), "R2-test");
}

#[tokio::test]
async fn test_secured_server_headers() {
    let shell = shell(StaticServer::secured(token("k", "v"))).await;

    let headers = shell.inject_headers(HashMap::new());

    let expected = HashMap::from([
        ("User-Agent".to_owned(), "R2".to_owned()),
        ("X-Debug-k".to_owned(), "v".to_owned()),
    ]);
    assert_eq!(headers, expected);
}

#[tokio::test]
async fn test_unsecured_server_headers() {
    let shell = shell(StaticServer::unsecured()).await;

    let headers = shell.inject_headers(HashMap::from([(
        "Accept".to_owned(),
        "text/html".to_owned(),
    )]));

    let expected = HashMap::from([
        ("Accept".to_owned(), "text/html".to_owned()),
        ("User-Agent".to_owned(), "R2".to_owned()),
    ]);
    assert_eq!(headers, expected);
}

#[tokio::test]
async fn test_no_server_only_stamps_user_agent() {
    let shell = ShellSessionsBuilder::new().build().await;

    let headers = shell.inject_headers(HashMap::new());

    assert_eq!(
        headers,
        HashMap::from([("User-Agent".to_owned(), "R2".to_owned())])
    );
    assert_eq!(
        shell.verify_certificate("127.0.0.1".to_owned()),
        CertificateVerdict::UsePlatformDefault
    );
}

#[tokio::test]
async fn test_handshake_verdicts() {
    let shell = shell(StaticServer::secured(token("k", "v"))).await;

    let accepted = shell.verify_certificate("127.0.0.1".to_owned());
    assert_eq!(accepted, CertificateVerdict::Accept);
    assert_eq!(certificate_verdict_code(accepted), 0);

    let deferred = shell.verify_certificate("example.com".to_owned());
    assert_eq!(deferred, CertificateVerdict::UsePlatformDefault);
    assert_eq!(certificate_verdict_code(deferred), -3);

    assert_eq!(certificate_verdict_code(CertificateVerdict::Reject), -2);
}

#[tokio::test]
async fn test_certificate_errors() {
    let shell = shell(StaticServer::secured(token("k", "v"))).await;

    assert_eq!(
        shell.certificate_error(
            "https://127.0.0.1:4040/pub/manifest.json".to_owned(),
            "net::ERR_CERT_AUTHORITY_INVALID".to_owned(),
        ),
        CertificateErrorDecision::Override
    );
    assert_eq!(
        shell.certificate_error(
            "https://example.com/".to_owned(),
            "net::ERR_CERT_AUTHORITY_INVALID".to_owned(),
        ),
        CertificateErrorDecision::Propagate {
            error: "net::ERR_CERT_AUTHORITY_INVALID".to_owned()
        }
    );
}

#[tokio::test]
async fn test_client_certificate_selection() {
    let shell = shell(StaticServer::secured(token("k", "v"))).await;
    let candidates = vec![ClientCertificate { data: vec![1, 2, 3] }];

    assert_eq!(
        shell.select_client_certificate(
            "https://127.0.0.1:4040/pub/".to_owned(),
            candidates.clone()
        ),
        ClientCertificateSelection::AutoSelect {
            certificate: ClientCertificate {
                data: token("k", "v").client_certificate
            }
        }
    );
    assert_eq!(
        shell.select_client_certificate("https://example.com/".to_owned(), candidates),
        ClientCertificateSelection::Default
    );
}
