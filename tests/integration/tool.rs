use crate::*;

use smbtrace_core::tool::{CaptureTool, MarkupFormat};
use smbtrace_core::ToolError;

#[tokio::test]
async fn test_tool_passes_filter_and_format() {
    if !skip_unless_ready() {
        return;
    }
    let ws = Workspace::new().unwrap();

    let out = ws
        .tool(10)
        .run(&ws.capture(), "smb2", MarkupFormat::Summary)
        .await
        .unwrap();
    assert_eq!(&out[..], LISTING.as_bytes());
    assert_eq!(ws.invocations(), ["psml smb2"]);
}

#[tokio::test]
async fn test_tool_times_out() {
    if !skip_unless_ready() {
        return;
    }
    let ws = Workspace::new().unwrap();
    ws.write("delay", "5").unwrap();

    let started = std::time::Instant::now();
    let result = ws
        .tool(1)
        .run(&ws.capture(), "smb", MarkupFormat::Summary)
        .await;
    assert!(matches!(result, Err(ToolError::Timeout(_))), "{result:?}");
    assert!(started.elapsed() < std::time::Duration::from_secs(4));
}

#[tokio::test]
async fn test_empty_output_is_an_error() {
    if !skip_unless_ready() {
        return;
    }
    let ws = Workspace::new().unwrap();
    ws.write("listing.psml", "").unwrap();

    let result = ws
        .tool(10)
        .run(&ws.capture(), "smb", MarkupFormat::Summary)
        .await;
    assert!(matches!(result, Err(ToolError::EmptyOutput)));
}
