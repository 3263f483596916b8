//! End-to-end scenarios and property tests across codec, partitioner,
//! scheduler and engine

use crate::*;
use proptest::prelude::*;

fn lowercase() -> Keyspace {
    Keyspace::new(Alphabet::lowercase())
}

#[test]
fn test_sequential_scan_finds_ab() {
    let engine = SearchEngine::new(lowercase(), TargetDigest::of_password("ab"), 1, 100).unwrap();
    let range = SearchRange::full(engine.keyspace(), 2);

    let outcome = engine.scan_sequential(range, 2, &CancelToken::new());
    let result = outcome.found().expect("ab is in the length-2 keyspace");

    assert_eq!(result.password, "ab");
    // 'a' * 26 + 'b'
    assert_eq!(result.position, 1);
    assert_eq!(result.digest, md5_hex(b"ab"));
}

#[test]
fn test_two_node_partition_meets() {
    let keyspace = Keyspace::default();
    let first = partition(&keyspace, 2, 0, 3).unwrap();
    let second = partition(&keyspace, 2, 1, 3).unwrap();

    assert_eq!(first.end + 1, second.start);
    assert_eq!(second.end, keyspace.total_combinations(3) - 1);
}

#[test]
fn test_reference_packet_schedule() {
    let scheduler = PacketScheduler::new(Keyspace::default(), 60_000, 8);

    let first = scheduler.next_packet(0);
    assert_eq!(
        (first.password_length, first.start_position, first.end_position),
        (1, 0, 94)
    );
    assert_eq!(scheduler.next_packet(1).password_length, 2);
}

#[test]
fn test_batch_match_independent_of_worker_count() {
    let target = TargetDigest::of_password("mno");
    let keyspace = lowercase();
    let expected = keyspace.decode("mno").unwrap();
    let (start, end) = (expected - 500, expected + 700);

    for workers in [1, 2, 3, 7, 16, 64] {
        let engine = SearchEngine::new(keyspace.clone(), target, workers, 100).unwrap();
        let result = engine.scan_batch(start, end, 3);

        assert!(result.found, "workers = {workers}");
        assert_eq!(result.position, expected, "workers = {workers}");
        assert_eq!(result.password, "mno");
    }
}

#[test]
fn test_batch_match_in_every_chunk_position() {
    let keyspace = lowercase();
    let engine_template = |password: &str| {
        SearchEngine::new(keyspace.clone(), TargetDigest::of_password(password), 4, 100).unwrap()
    };

    // 0..676 split in 4 chunks of 169; one password per chunk
    for position in [3, 170, 400, 675] {
        let password = keyspace.encode(position, 2);
        let engine = engine_template(&password);
        let result = engine.scan_batch(0, 676, 2);
        assert!(result.found);
        assert_eq!(result.position, position);
    }
}

#[test]
fn test_packet_and_node_workflows_share_engine_results() {
    let config = SearchConfig {
        alphabet: "xyz01".to_string(),
        packet_capacity: 7,
        max_password_length: 4,
        workers: 3,
        window_per_worker: 2,
        show_progress: false,
        rate_sample_ms: 0,
    };
    let target = TargetDigest::of_password("z0x");
    let session = SearchSession::new(config, target).unwrap();

    let by_packets = session
        .run(SearchJob::Packets { first: 0, count: None })
        .unwrap();
    let by_nodes = (0..3)
        .map(|i| {
            session
                .run(SearchJob::Node {
                    total_nodes: 3,
                    node_index: i,
                    length: 3,
                    mode: ScanMode::Batched,
                })
                .unwrap()
        })
        .find(|report| report.found().is_some())
        .expect("one node owns the match");

    assert_eq!(by_packets.found(), by_nodes.found());
    assert_eq!(by_packets.found().unwrap().position, 2 * 25 + 3 * 5);
}

#[test]
fn test_packets_tile_reference_lengths_one_to_three() {
    let scheduler = PacketScheduler::new(Keyspace::default(), 60_000, 3);
    let mut expected = (1i32, 0i64);

    for packet in scheduler.packets(0) {
        if packet.password_length != expected.0 {
            assert_eq!(packet.password_length, expected.0 + 1);
            assert_eq!(expected.1, scheduler.keyspace().total_combinations(expected.0 as usize));
            expected = (packet.password_length, 0);
        }
        assert_eq!(packet.start_position, expected.1);
        expected.1 = packet.end_position + 1;
    }

    assert_eq!(expected, (3, 857_375));
    assert!(!scheduler.next_packet(17).is_valid());
}

proptest! {
    #[test]
    fn prop_encode_decode_round_trip(length in 1usize..=9, seed in any::<u64>()) {
        let keyspace = Keyspace::default();
        let total = keyspace.total_combinations(length);
        let position = (seed % total as u64) as i64;

        let password = keyspace.encode(position, length);
        prop_assert_eq!(password.len(), length);
        prop_assert!(password.bytes().all(|b| keyspace.alphabet().contains(b)));
        prop_assert_eq!(keyspace.decode(&password), Some(position));
    }

    #[test]
    fn prop_total_combinations_monotonic(symbols in 1usize..=95, length in 0usize..40) {
        let alphabet = Alphabet::new(&alphabet::FULL_SYMBOLS[..symbols]).unwrap();
        let keyspace = Keyspace::new(alphabet);

        let here = keyspace.total_combinations(length);
        let next = keyspace.total_combinations(length + 1);
        prop_assert!(here >= 1);
        prop_assert!(next >= here);
    }

    #[test]
    fn prop_partition_covers_exactly(nodes in 1usize..40, symbols in 2usize..=12, length in 1usize..=5) {
        let alphabet = Alphabet::new(&alphabet::FULL_SYMBOLS[..symbols]).unwrap();
        let keyspace = Keyspace::new(alphabet);
        let total = keyspace.total_combinations(length);

        let ranges: Vec<SearchRange> = (0..nodes)
            .map(|i| partition(&keyspace, nodes, i, length).unwrap())
            .collect();

        prop_assert_eq!(ranges[0].start, 0);
        prop_assert_eq!(ranges[nodes - 1].end, total - 1);
        for pair in ranges.windows(2) {
            prop_assert_eq!(pair[0].end + 1, pair[1].start);
        }
        prop_assert_eq!(ranges.iter().map(|r| r.size()).sum::<i64>(), total);
    }

    #[test]
    fn prop_scheduler_tiles_space(symbols in 1usize..=6, capacity in 1i64..50, max_length in 1usize..=4) {
        let alphabet = Alphabet::new(&alphabet::FULL_SYMBOLS[..symbols]).unwrap();
        let scheduler = PacketScheduler::new(Keyspace::new(alphabet), capacity, max_length);

        let mut length = 1usize;
        let mut next_start = 0i64;
        let mut seen = 0u64;
        for packet in scheduler.packets(0) {
            let total = scheduler.keyspace().total_combinations(length);
            if next_start == total {
                length += 1;
                next_start = 0;
            }
            prop_assert_eq!(packet.packet_number, seen);
            prop_assert_eq!(packet.password_length as usize, length);
            prop_assert_eq!(packet.start_position, next_start);
            prop_assert!(packet.end_position >= packet.start_position);
            prop_assert!(packet.size() <= capacity);
            next_start = packet.end_position + 1;
            seen += 1;
        }

        prop_assert_eq!(length, max_length);
        prop_assert_eq!(next_start, scheduler.keyspace().total_combinations(max_length));
        prop_assert_eq!(seen, scheduler.packet_count());
        prop_assert!(!scheduler.next_packet(seen).is_valid());
        prop_assert!(!scheduler.next_packet(seen + 10).is_valid());
    }
}
