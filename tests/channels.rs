use std::collections::BTreeSet;

use rawscope::data::channels::{ChannelIndex, GroupRule, ALL_CHANNELS, OTHER_GROUP};
use rawscope::{ChannelMetadata, ChannelType};

fn metadata(names: Vec<String>) -> ChannelMetadata {
    ChannelMetadata {
        types: vec![ChannelType::Eeg; names.len()],
        names,
        sample_rate: 250.0,
        total_samples: 1000,
        bad_channels: BTreeSet::new(),
    }
}

fn numbered(n: usize) -> ChannelMetadata {
    metadata((0..n).map(|i| format!("CH{i:02}")).collect())
}

#[test]
fn shrinking_room_clamps_offset() {
    let mut index = ChannelIndex::new(&numbered(64), &GroupRule::default_table(), 20);
    index.set_offset(50);
    assert_eq!(index.offset(), 44);
    index.set_count(30);
    assert_eq!(index.count(), 30);
    assert_eq!(index.offset(), 34);
    assert_eq!(index.visible_channel_indices(), (34..64).collect::<Vec<_>>());
}

#[test]
fn changing_group_resets_offset() {
    let mut names: Vec<String> = (1..=30).map(|i| format!("F{i}")).collect();
    names.extend((1..=30).map(|i| format!("C{i}")));
    let mut index = ChannelIndex::new(&metadata(names), &GroupRule::default_table(), 10);
    index.set_offset(25);
    assert_eq!(index.offset(), 25);

    assert!(index.set_group("C"));
    assert_eq!(index.offset(), 0);
    assert_eq!(index.group_size(), 30);
    assert_eq!(index.max_offset(), 20);
    index.set_offset(100);
    assert_eq!(index.offset(), 20);
    assert_eq!(index.visible_channel_indices(), (50..60).collect::<Vec<_>>());
}

#[test]
fn count_larger_than_group_shows_whole_group() {
    let names = vec!["Fp1".to_string(), "Fp2".to_string(), "Cz".to_string()];
    let mut index = ChannelIndex::new(&metadata(names), &GroupRule::default_table(), 20);
    assert_eq!(index.count(), 3);
    index.set_group("Fp");
    assert_eq!(index.max_offset(), 0);
    assert_eq!(index.visible_channel_indices(), vec![0, 1]);
}

#[test]
fn unknown_group_is_ignored() {
    let mut index = ChannelIndex::new(&numbered(8), &GroupRule::default_table(), 4);
    index.set_offset(2);
    assert!(!index.set_group("Nope"));
    assert_eq!(index.group(), ALL_CHANNELS);
    assert_eq!(index.offset(), 2);
}

#[test]
fn groups_follow_table_order_with_other_last() {
    let names = ["X1", "O1", "Fp1", "Fz", "EOG", "T7"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let index = ChannelIndex::new(&metadata(names), &GroupRule::default_table(), 4);
    assert_eq!(
        index.group_names(),
        vec![ALL_CHANNELS, "Fp", "F", "O", "T", "EOG", OTHER_GROUP]
    );
}

#[test]
fn custom_table_can_merge_prefixes() {
    let rules = vec![
        GroupRule::new("Fp", "Frontal"),
        GroupRule::new("F", "Frontal"),
        GroupRule::new("C", "Central"),
    ];
    let names = ["Cz", "Fp1", "F3"].iter().map(|s| s.to_string()).collect();
    let mut index = ChannelIndex::new(&metadata(names), &rules, 4);
    assert_eq!(index.group_names(), vec![ALL_CHANNELS, "Frontal", "Central"]);
    index.set_group("Frontal");
    assert_eq!(index.visible_channel_indices(), vec![1, 2]);
}

#[test]
fn bad_channels_never_change_order() {
    let mut meta = numbered(6);
    meta.bad_channels.insert("CH02".to_string());
    let index = ChannelIndex::new(&meta, &GroupRule::default_table(), 6);
    assert!(index.is_bad("CH02"));
    assert!(!index.is_bad("CH03"));
    assert_eq!(index.visible_channel_indices(), (0..6).collect::<Vec<_>>());
}
