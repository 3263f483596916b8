//! Job packets: bounded units of work over the whole configured keyspace
//!
//! Packet numbers form a single global sequence. Packet 0 starts at the
//! first candidate of length 1; each length is split into `capacity`-sized
//! packets (the last one of a length may be shorter) before moving on to
//! the next length. After the maximum length every request yields the
//! invalid marker, which means the configured space has been searched.

use crate::codec::Keyspace;
use crate::partition::SearchRange;
use std::fmt;

/// Reference packet capacity
pub const DEFAULT_PACKET_CAPACITY: i64 = 60_000;

/// Reference maximum password length
pub const DEFAULT_MAX_PASSWORD_LENGTH: usize = 8;

/// One contiguous slice of positions at a fixed length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobPacket {
    pub start_position: i64,
    pub end_position: i64,
    pub packet_number: u64,
    /// `-1` marks the invalid packet
    pub password_length: i32,
}

impl JobPacket {
    /// Marker returned once the configured space is used up
    pub fn exhausted(packet_number: u64) -> Self {
        Self {
            start_position: -1,
            end_position: -1,
            packet_number,
            password_length: -1,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.password_length > 0
    }

    /// Positions covered, if the packet is valid
    pub fn range(&self) -> Option<SearchRange> {
        if !self.is_valid() {
            return None;
        }
        SearchRange::try_new(self.start_position, self.end_position)
    }

    /// Password length, if the packet is valid
    pub fn length(&self) -> Option<usize> {
        self.is_valid().then_some(self.password_length as usize)
    }

    pub fn size(&self) -> i64 {
        self.range().map_or(0, |r| r.size())
    }
}

impl fmt::Display for JobPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(
                f,
                "packet #{} (length {}, {}..={})",
                self.packet_number, self.password_length, self.start_position, self.end_position
            )
        } else {
            write!(f, "packet #{} (beyond search space)", self.packet_number)
        }
    }
}

/// Maps global packet numbers to packets
#[derive(Debug, Clone)]
pub struct PacketScheduler {
    keyspace: Keyspace,
    capacity: i64,
    max_length: usize,
}

impl PacketScheduler {
    /// `capacity` and `max_length` must be positive; `SearchConfig::validate`
    /// enforces this for configured schedulers.
    pub fn new(keyspace: Keyspace, capacity: i64, max_length: usize) -> Self {
        debug_assert!(capacity > 0);
        Self {
            keyspace,
            capacity: capacity.max(1),
            max_length,
        }
    }

    pub fn capacity(&self) -> i64 {
        self.capacity
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn keyspace(&self) -> &Keyspace {
        &self.keyspace
    }

    /// Packets needed to cover every candidate of `length`
    pub fn packets_for_length(&self, length: usize) -> u64 {
        let total = self.keyspace.total_combinations(length);
        let full = total / self.capacity;
        let partial = i64::from(total % self.capacity != 0);
        (full + partial) as u64
    }

    /// Total number of valid packets; saturates like the combination counts
    pub fn packet_count(&self) -> u64 {
        (1..=self.max_length)
            .map(|length| self.packets_for_length(length))
            .fold(0u64, u64::saturating_add)
    }

    /// Packet for a global packet number
    pub fn next_packet(&self, packet_number: u64) -> JobPacket {
        let mut budget = packet_number;

        for length in 1..=self.max_length {
            let needed = self.packets_for_length(length);
            if budget < needed {
                let total = self.keyspace.total_combinations(length);
                // budget < ceil(total / capacity) keeps this below total
                let start = (budget as i64).saturating_mul(self.capacity);
                let end = start.saturating_add(self.capacity - 1).min(total - 1);

                return JobPacket {
                    start_position: start,
                    end_position: end,
                    packet_number,
                    password_length: length as i32,
                };
            }
            budget -= needed;
        }

        JobPacket::exhausted(packet_number)
    }

    /// Packet number holding `position` at `length`, if inside the configured space
    pub fn locate(&self, length: usize, position: i64) -> Option<u64> {
        if length == 0 || length > self.max_length {
            return None;
        }
        if position < 0 || position >= self.keyspace.total_combinations(length) {
            return None;
        }

        let before = (1..length)
            .map(|l| self.packets_for_length(l))
            .fold(0u64, u64::saturating_add);
        Some(before.saturating_add((position / self.capacity) as u64))
    }

    /// Successive packets starting at `first`, ending before the invalid marker
    pub fn packets(&self, first: u64) -> Packets<'_> {
        Packets {
            scheduler: self,
            next: Some(first),
        }
    }
}

/// Iterator returned by [`PacketScheduler::packets`]
#[derive(Debug)]
pub struct Packets<'a> {
    scheduler: &'a PacketScheduler,
    next: Option<u64>,
}

impl Iterator for Packets<'_> {
    type Item = JobPacket;

    fn next(&mut self) -> Option<Self::Item> {
        let number = self.next?;
        let packet = self.scheduler.next_packet(number);
        if !packet.is_valid() {
            self.next = None;
            return None;
        }
        self.next = number.checked_add(1);
        Some(packet)
    }
}

/// Strict decimal packet number.
///
/// Anything but plain ASCII digits (empty input, signs, whitespace,
/// overflow) is rejected so callers can ignore the request untouched.
pub fn parse_packet_number(input: &str) -> Option<u64> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    input.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::Alphabet;

    fn reference_scheduler() -> PacketScheduler {
        PacketScheduler::new(
            Keyspace::default(),
            DEFAULT_PACKET_CAPACITY,
            DEFAULT_MAX_PASSWORD_LENGTH,
        )
    }

    #[test]
    fn test_first_packets() {
        let scheduler = reference_scheduler();

        let first = scheduler.next_packet(0);
        assert_eq!(first.password_length, 1);
        assert_eq!(first.start_position, 0);
        assert_eq!(first.end_position, 94);

        let second = scheduler.next_packet(1);
        assert_eq!(second.password_length, 2);
        assert_eq!(second.start_position, 0);
        assert_eq!(second.end_position, 9024);

        // 95^3 = 857375 needs 15 packets; the last is short
        let third = scheduler.next_packet(2);
        assert_eq!(third.password_length, 3);
        assert_eq!((third.start_position, third.end_position), (0, 59_999));
        let last_of_three = scheduler.next_packet(16);
        assert_eq!(last_of_three.password_length, 3);
        assert_eq!(last_of_three.start_position, 14 * 60_000);
        assert_eq!(last_of_three.end_position, 857_374);
        assert_eq!(scheduler.next_packet(17).password_length, 4);
    }

    #[test]
    fn test_packet_counts() {
        let scheduler = reference_scheduler();
        assert_eq!(scheduler.packets_for_length(1), 1);
        assert_eq!(scheduler.packets_for_length(3), 15);
        assert_eq!(scheduler.packets_for_length(8), 110_570_071_882);
        assert_eq!(scheduler.packet_count(), 111_746_349_247);
    }

    #[test]
    fn test_exhaustion_marker() {
        let scheduler = reference_scheduler();
        let count = scheduler.packet_count();

        let last = scheduler.next_packet(count - 1);
        assert!(last.is_valid());
        assert_eq!(last.password_length, 8);
        assert_eq!(last.end_position, Keyspace::default().total_combinations(8) - 1);

        for number in [count, count + 1, u64::MAX] {
            let packet = scheduler.next_packet(number);
            assert!(!packet.is_valid());
            assert_eq!(packet.password_length, -1);
            assert_eq!(packet.start_position, -1);
            assert_eq!(packet.end_position, -1);
            assert!(packet.range().is_none());
        }
    }

    #[test]
    fn test_inverted_packet_has_no_range() {
        let packet = JobPacket {
            start_position: 10,
            end_position: 2,
            packet_number: 0,
            password_length: 3,
        };
        assert!(packet.is_valid());
        assert!(packet.range().is_none());
        assert_eq!(packet.size(), 0);
    }

    #[test]
    fn test_iterator_stops_at_marker() {
        let keyspace = Keyspace::new(Alphabet::new("abc").unwrap());
        let scheduler = PacketScheduler::new(keyspace, 4, 2);

        let packets: Vec<_> = scheduler
            .packets(0)
            .map(|p| (p.password_length, p.start_position, p.end_position))
            .collect();
        assert_eq!(packets, vec![(1, 0, 2), (2, 0, 3), (2, 4, 7), (2, 8, 8)]);
        assert_eq!(scheduler.packets(3).count(), 1);
        assert_eq!(scheduler.packets(4).count(), 0);
    }

    #[test]
    fn test_locate_matches_schedule() {
        let scheduler = reference_scheduler();
        let keyspace = Keyspace::default();

        for (length, position) in [(1, 0), (1, 94), (2, 9024), (3, 0), (3, 857_374), (5, 123_456_789)] {
            let number = scheduler.locate(length, position).unwrap();
            let packet = scheduler.next_packet(number);
            assert_eq!(packet.password_length as usize, length);
            assert!(packet.range().unwrap().contains(position));
        }

        assert_eq!(scheduler.locate(3, keyspace.total_combinations(3)), None);
        assert_eq!(scheduler.locate(9, 0), None);
        assert_eq!(scheduler.locate(0, 0), None);
        assert_eq!(scheduler.locate(2, -5), None);
    }

    #[test]
    fn test_parse_packet_number() {
        assert_eq!(parse_packet_number("0"), Some(0));
        assert_eq!(parse_packet_number("0042"), Some(42));
        assert_eq!(parse_packet_number("18446744073709551615"), Some(u64::MAX));
        assert_eq!(parse_packet_number(""), None);
        assert_eq!(parse_packet_number("-1"), None);
        assert_eq!(parse_packet_number("+1"), None);
        assert_eq!(parse_packet_number(" 7"), None);
        assert_eq!(parse_packet_number("12a"), None);
        assert_eq!(parse_packet_number("18446744073709551616"), None);
    }
}
