/// Connector-based splitting is left to the meaning-based re-splitter that
/// runs after segmentation; this stage only keeps the pipeline shape.
pub fn split_by_connector(sentences: Vec<String>) -> Vec<String> {
    sentences
}
