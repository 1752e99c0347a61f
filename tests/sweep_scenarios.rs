//! End-to-end sweeps over the file-system mailbox and CSV audit workbook.

use mailsweep::adapters::audit::{CsvWorkbookLog, MemoryAuditLog};
use mailsweep::adapters::http::{HttpDispatcher, StaticDispatcher};
use mailsweep::adapters::mailbox::{LabelDirSource, MemoryConversationSource, label_dir::TRASH_DIR};
use mailsweep::domain::{AUDIT_HEADER, DomainError, MailMessage};
use mailsweep::shared::config::SweepConfig;
use mailsweep::usecases::SweepService;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn temp_root(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "mailsweep-it-{}-{}",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn msg(subject: &str, body: &str) -> MailMessage {
    MailMessage {
        subject: subject.into(),
        body: body.into(),
    }
}

/// Answer every request with 204 until the test ends.
async fn serve_no_content() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf).await;
                let _ = stream
                    .write_all(b"HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n")
                    .await;
                let _ = stream.shutdown().await;
            });
        }
    });
    format!("http://{}", addr)
}

async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/unsubscribe", addr)
}

#[tokio::test]
async fn scenario_link_found_and_followed() {
    let root = temp_root("followed");
    let base = serve_no_content().await;
    let mailbox = LabelDirSource::new(root.join("mailbox"));
    mailbox
        .store(
            "Unsubscribe",
            "001",
            &[msg(
                "Weekly deals",
                &format!(r#"<a href="{}/u?id=1">Click to unsubscribe</a>"#, base),
            )],
        )
        .await
        .unwrap();
    let audit = Arc::new(CsvWorkbookLog::open(root.join("audit"), 0).await.unwrap());

    let svc = SweepService::new(
        Arc::new(mailbox),
        audit.clone(),
        Arc::new(HttpDispatcher::direct(Duration::from_secs(5)).unwrap()),
        SweepConfig::default(),
    );
    let report = svc.run().await.unwrap();
    assert_eq!(report.attempted, 1);

    let rows = audit.rows().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], AUDIT_HEADER.to_vec());
    assert_eq!(rows[1][1], "Weekly deals");
    assert_eq!(rows[1][2], "Attempted to Unsubscribe");
    assert_eq!(rows[1][3], "");
    assert!(root.join("mailbox").join(TRASH_DIR).join("001.json").exists());
    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn scenario_no_link_found() {
    let root = temp_root("nolink");
    let mailbox = LabelDirSource::new(root.join("mailbox"));
    mailbox
        .store("Unsubscribe", "001", &[msg("Hello", "<p>No links here</p>")])
        .await
        .unwrap();
    let audit = Arc::new(CsvWorkbookLog::open(root.join("audit"), 0).await.unwrap());
    let dispatcher = Arc::new(StaticDispatcher::followed(200));

    let svc = SweepService::new(
        Arc::new(mailbox),
        audit.clone(),
        dispatcher.clone(),
        SweepConfig::default(),
    );
    let report = svc.run().await.unwrap();

    assert_eq!(report.no_link, 1);
    assert!(dispatcher.calls().is_empty());
    let rows = audit.rows().await.unwrap();
    assert_eq!(rows[1][2], "No Unsubscribe Link Found");
    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn scenario_unreachable_host_still_attempted() {
    let root = temp_root("unreachable");
    let url = unreachable_url().await;
    let mailbox = LabelDirSource::new(root.join("mailbox"));
    mailbox
        .store(
            "Unsubscribe",
            "001",
            &[msg(
                "Dead sender",
                &format!(r#"<a href="{}">unsubscribe</a>"#, url),
            )],
        )
        .await
        .unwrap();
    let audit = Arc::new(CsvWorkbookLog::open(root.join("audit"), 0).await.unwrap());

    let svc = SweepService::new(
        Arc::new(mailbox),
        audit.clone(),
        Arc::new(HttpDispatcher::direct(Duration::from_secs(5)).unwrap()),
        SweepConfig::default(),
    );
    let report = svc.run().await.unwrap();

    assert_eq!(report.attempted, 1);
    assert_eq!(report.failed, 0);
    let rows = audit.rows().await.unwrap();
    assert_eq!(rows[1][2], "Attempted to Unsubscribe");
    assert_eq!(rows[1][3], "");
    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn scenario_middle_conversation_fails() {
    let root = temp_root("middle");
    let mailbox_dir = root.join("mailbox");
    let mailbox = LabelDirSource::new(&mailbox_dir);
    let unsub = r#"<a href="https://x.test/u?id=1">Click to unsubscribe</a>"#;
    mailbox
        .store("Unsubscribe", "001", &[msg("First", unsub)])
        .await
        .unwrap();
    std::fs::write(
        mailbox_dir.join("Unsubscribe").join("002.json"),
        "{\"messages\": [",
    )
    .unwrap();
    mailbox
        .store("Unsubscribe", "003", &[msg("Third", "<p>plain</p>")])
        .await
        .unwrap();
    let audit = Arc::new(CsvWorkbookLog::open(root.join("audit"), 0).await.unwrap());

    let svc = SweepService::new(
        Arc::new(mailbox),
        audit.clone(),
        Arc::new(StaticDispatcher::followed(200)),
        SweepConfig::default(),
    );
    let report = svc.run().await.unwrap();

    assert_eq!(report.conversations, 3);
    assert_eq!(report.failed, 1);
    assert_eq!(report.discarded, 2);

    let rows = audit.rows().await.unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[1][1], "First");
    assert_eq!(rows[2][1], "Error processing email");
    assert_eq!(rows[2][2], "Failed");
    assert!(!rows[2][3].is_empty());
    assert_eq!(rows[3][1], "Third");

    let trash = mailbox_dir.join(TRASH_DIR);
    assert!(trash.join("001.json").exists());
    assert!(trash.join("003.json").exists());
    assert!(mailbox_dir.join("Unsubscribe").join("002.json").exists());
    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn setup_failure_adds_no_rows() {
    let root = temp_root("setup");
    let audit = Arc::new(CsvWorkbookLog::open(root.join("audit"), 0).await.unwrap());
    let svc = SweepService::new(
        Arc::new(LabelDirSource::new(root.join("mailbox"))),
        audit.clone(),
        Arc::new(StaticDispatcher::followed(200)),
        SweepConfig::default(),
    );

    let err = svc.run().await.unwrap_err();
    assert!(matches!(err, DomainError::LabelNotFound(_)));
    assert_eq!(audit.rows().await.unwrap().len(), 1);
    let _ = std::fs::remove_dir_all(&root);
}

#[tokio::test]
async fn audit_failure_is_contained_per_conversation() {
    let source = Arc::new(MemoryConversationSource::new());
    source.add(
        "Unsubscribe",
        "t1",
        vec![msg("One", r#"<a href="https://x.test/1">unsubscribe</a>"#)],
    );
    source.add(
        "Unsubscribe",
        "t2",
        vec![msg("Two", r#"<a href="https://x.test/2">unsubscribe</a>"#)],
    );
    let audit = Arc::new(MemoryAuditLog::new());
    audit.fail_appends("sheet is read-only");
    let dispatcher = Arc::new(StaticDispatcher::followed(200));

    let svc = SweepService::new(
        source.clone(),
        audit.clone(),
        dispatcher.clone(),
        SweepConfig::default(),
    );
    let report = svc.run().await.unwrap();

    assert_eq!(report.failed, 2);
    assert_eq!(
        dispatcher.calls(),
        vec!["https://x.test/1".to_string(), "https://x.test/2".to_string()]
    );
    assert!(source.discarded().is_empty());
    assert!(audit.records().is_empty());
}
