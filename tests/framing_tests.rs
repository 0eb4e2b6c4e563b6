use odisi_stream::FrameSplitter;

fn packet(json: &str, checksum: &str) -> Vec<u8> {
    format!("{json}\r\n{checksum}\0").into_bytes()
}

#[test]
fn two_complete_packets_in_one_read() {
    let mut stream = packet(r#"{"a":1}"#, "C1");
    stream.extend(packet(r#"{"b":2}"#, "C2"));

    let mut splitter = FrameSplitter::new();
    let frames = splitter.push(&stream);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].payload, r#"{"a":1}"#);
    assert_eq!(frames[0].checksum.as_deref(), Some("C1"));
    assert_eq!(frames[1].payload, r#"{"b":2}"#);
    assert_eq!(frames[1].checksum.as_deref(), Some("C2"));
    assert!(splitter.pending().is_empty());
}

#[test]
fn complete_packet_plus_trailing_fragment() {
    let mut stream = packet(r#"{"a":1}"#, "C1");
    stream.extend(b"{\"b\":");

    let mut splitter = FrameSplitter::new();
    let frames = splitter.push(&stream);
    assert_eq!(frames.len(), 1);
    assert_eq!(splitter.pending(), b"{\"b\":");
}

#[test]
fn fragment_completes_across_reads() {
    let full = packet(r#"{"a":1}"#, "C1");
    let (head, tail) = full.split_at(5);

    let mut splitter = FrameSplitter::new();
    assert!(splitter.push(head).is_empty());
    let frames = splitter.push(tail);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].payload, r#"{"a":1}"#);
}

#[test]
fn non_json_fragment_is_dropped() {
    let mut splitter = FrameSplitter::new();
    let frames = splitter.push(b"garbage without opener");
    assert!(frames.is_empty());
    assert!(splitter.pending().is_empty());
}

#[test]
fn non_json_candidate_before_terminator_is_dropped() {
    let mut stream = b"leading junk\0".to_vec();
    stream.extend(packet(r#"{"a":1}"#, "C1"));

    let mut splitter = FrameSplitter::new();
    let frames = splitter.push(&stream);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].payload, r#"{"a":1}"#);
}

#[test]
fn buffering_read_with_no_terminator_yields_nothing() {
    let mut splitter = FrameSplitter::new();
    assert!(splitter.push(b"{\"a\":1").is_empty());
    assert_eq!(splitter.pending(), b"{\"a\":1");
}

#[test]
fn empty_read_is_a_no_op() {
    let mut splitter = FrameSplitter::new();
    assert!(splitter.push(b"").is_empty());
    assert!(splitter.pending().is_empty());
}
