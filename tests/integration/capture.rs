use crate::*;

use smbtrace_core::{FetchError, LoadError, ToolError};

/// Listing goes through the process and comes back in capture order.
#[tokio::test]
async fn test_load_capture_lists_packets() {
    if !skip_unless_ready() {
        return;
    }
    let ws = Workspace::new().unwrap();
    let mut session = ws.session();

    session.load_capture(ws.capture()).await.unwrap();

    let summaries = session.summaries();
    assert_eq!(
        summaries.iter().map(|s| s.number).collect::<Vec<_>>(),
        [4, 5, 9]
    );
    assert_eq!(
        summaries.iter().map(|s| s.timestamp).collect::<Vec<_>>(),
        [0.0, 0.001337, 0.004812]
    );
    assert_eq!(summaries[1].source, "192.168.56.20");
    assert_eq!(summaries[1].protocol, "SMB2");
    assert_eq!(summaries[2].info, "Create Request File: docs\\report.txt & notes");

    assert_eq!(ws.invocations(), ["psml !browser && (smb||smb2)"]);
}

#[tokio::test]
async fn test_detail_tree_is_fetched_once() {
    if !skip_unless_ready() {
        return;
    }
    let ws = Workspace::new().unwrap();
    ws.set_detail(5, DETAIL_5).unwrap();
    let mut session = ws.session();
    session.load_capture(ws.capture()).await.unwrap();

    let first = session.detail_tree(5).await.unwrap();
    let second = session.detail_tree(5).await.unwrap();
    assert_eq!(first, second);

    let labels: Vec<&str> = first.children.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, ["geninfo", "frame", "nbss", "smb2"]);
    assert_eq!(
        first.find("smb2.dialect").map(|n| n.display_value.as_str()),
        Some("Dialect: SMB 2.1 (0x0210)")
    );

    let detail_calls = ws
        .invocations()
        .iter()
        .filter(|line| line.starts_with("pdml"))
        .count();
    assert_eq!(detail_calls, 1, "second request should be a cache hit");
    assert_eq!(session.cached_details(), 1);
}

#[tokio::test]
async fn test_raw_markup_is_returned_verbatim() {
    if !skip_unless_ready() {
        return;
    }
    let ws = Workspace::new().unwrap();
    ws.set_detail(5, DETAIL_5).unwrap();
    let mut session = ws.session();
    session.load_capture(ws.capture()).await.unwrap();

    let markup = session.detail_markup(5).await.unwrap();
    assert_eq!(&markup[..], DETAIL_5.as_bytes());
    assert_eq!(ws.invocations().last().unwrap(), "pdml frame.number == 5");
}

#[tokio::test]
async fn test_unmatched_frame_is_unknown_packet() {
    if !skip_unless_ready() {
        return;
    }
    let ws = Workspace::new().unwrap();
    let mut session = ws.session();
    session.load_capture(ws.capture()).await.unwrap();

    for _ in 0..2 {
        assert!(matches!(
            session.detail_tree(1000).await,
            Err(FetchError::UnknownPacket(1000))
        ));
    }

    let detail_calls = ws
        .invocations()
        .iter()
        .filter(|line| line.starts_with("pdml"))
        .count();
    assert_eq!(detail_calls, 1, "unmatched frame should not be fetched again");
    assert_eq!(session.cached_details(), 1);
}

#[tokio::test]
async fn test_empty_listing_loads() {
    if !skip_unless_ready() {
        return;
    }
    let ws = Workspace::new().unwrap();
    let structure_only = LISTING
        .split("<packet>")
        .next()
        .unwrap()
        .to_string()
        + "</psml>\n";
    ws.write("listing.psml", &structure_only).unwrap();

    let mut session = ws.session();
    session.load_capture(ws.capture()).await.unwrap();
    assert!(session.is_loaded());
    assert!(session.summaries().is_empty());
}

#[tokio::test]
async fn test_changed_columns_are_a_schema_violation() {
    if !skip_unless_ready() {
        return;
    }
    let ws = Workspace::new().unwrap();
    let swapped = LISTING.replacen(
        "<section>Source</section>\n<section>Destination</section>",
        "<section>Destination</section>\n<section>Source</section>",
        1,
    );
    ws.write("listing.psml", &swapped).unwrap();

    let mut session = ws.session();
    assert!(matches!(
        session.load_capture(ws.capture()).await,
        Err(LoadError::SchemaViolation(_))
    ));
    assert!(!session.is_loaded());
}

#[tokio::test]
async fn test_missing_capture_is_process_failure() {
    if !skip_unless_ready() {
        return;
    }
    let ws = Workspace::new().unwrap();
    std::fs::remove_file(ws.capture()).unwrap();

    let mut session = ws.session();
    match session.load_capture(ws.capture()).await {
        Err(LoadError::ProcessFailed(ToolError::Exit { status, stderr })) => {
            assert_eq!(status.code(), Some(2));
            assert!(stderr.contains("doesn't exist"), "stderr: {stderr}");
        }
        other => panic!("expected exit failure, got {other:?}"),
    }
}
