use super::*;

#[test]
fn frame_length_must_match_dimensions() {
    let frame = FrameRgb::new(3, 2, vec![7; 18]).unwrap();
    assert_eq!(frame.pixel(2, 1), [7, 7, 7]);
    let err = FrameRgb::new(3, 2, vec![0; 17]).unwrap_err();
    assert!(matches!(err, CppnError::Validation(_)));
    assert!(err.to_string().contains("17 bytes"));
    assert!(FrameRgb::new(0, 0, Vec::new()).is_ok());
}

#[test]
fn in_memory_sink_keeps_order_and_clears_on_abort() {
    let mut sink = InMemorySink::new();
    sink.begin(SinkConfig {
        width: 1,
        height: 1,
        fps: Fps::default(),
    })
    .unwrap();
    let px = FrameRgb::new(1, 1, vec![1, 2, 3]).unwrap();
    sink.push_frame(FrameIndex(0), &px).unwrap();
    sink.push_frame(FrameIndex(2), &px).unwrap();
    assert!(sink.push_frame(FrameIndex(2), &px).is_err());
    assert_eq!(sink.frames().len(), 2);
    sink.abort();
    assert!(sink.frames().is_empty());
    assert!(!sink.is_finished());
}
