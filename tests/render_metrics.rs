use std::collections::HashMap;

use diagram_docs::application::render::{DocRenderService, RenderPipelineConfig, RenderRequest};
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

#[test]
fn render_emits_document_and_diagram_counters() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let service = DocRenderService::new(RenderPipelineConfig {
        highlight: false,
        ..RenderPipelineConfig::default()
    });
    let markdown = "```mermaid\ngraph LR\nA-->B\n```\n\n```graph TD\nC-->D\n```\n\n```text\nplain\n```\n";
    service
        .render(&RenderRequest::new("metrics", markdown))
        .expect("render succeeds");
    service
        .render(&RenderRequest::new("metrics", "no code here\n"))
        .expect("render succeeds");

    let counters: HashMap<String, u64> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(composite_key, _, _, value)| match value {
            DebugValue::Counter(count) => Some((composite_key.key().name().to_string(), count)),
            _ => None,
        })
        .collect();

    assert_eq!(counters.get("diagram_docs_render_total"), Some(&2));
    assert_eq!(counters.get("diagram_docs_diagram_blocks_total"), Some(&2));
}
