use rawscope::data::hotkeys::*;

#[test]
fn defaults_cover_every_action() {
    let hk = Hotkeys::default();
    let expect = [
        ('T', Modifier::None, HotkeyName::TimeMode),
        ('C', Modifier::None, HotkeyName::ChannelMode),
        ('A', Modifier::None, HotkeyName::AnnotateMode),
        ('R', Modifier::None, HotkeyName::ResetView),
        ('A', Modifier::Ctrl, HotkeyName::SelectAll),
    ];
    for (key, modifier, name) in expect {
        assert_eq!(hk.action_for(&Hotkey::new(modifier, key)), Some(name));
    }
    assert_eq!(hk.find_conflict(), None);
}

#[test]
fn lowercase_input_matches() {
    let hk = Hotkeys::default();
    assert_eq!(
        hk.action_for(&Hotkey::new(Modifier::None, 't')),
        Some(HotkeyName::TimeMode)
    );
    assert_eq!(hk.action_for(&Hotkey::new(Modifier::Shift, 't')), None);
}

#[test]
fn display_and_parse_agree() {
    let hk = Hotkey::new(Modifier::CtrlShift, 'r');
    assert_eq!(hk.to_string(), "Ctrl+Shift+R");
    assert_eq!("ctrl + shift + r".parse::<Hotkey>().unwrap(), hk);
    assert_eq!("Space".parse::<Hotkey>().unwrap().key, ' ');
    assert_eq!(Hotkey::new(Modifier::None, ' ').to_string(), "Space");
}

#[test]
fn parse_rejects_garbage() {
    assert!("".parse::<Hotkey>().is_err());
    assert!("Meta+X".parse::<Hotkey>().is_err());
    assert!("Alt+Alt+X".parse::<Hotkey>().is_err());
}

#[test]
fn rebinding_onto_existing_key_is_a_conflict() {
    let mut hk = Hotkeys::default();
    hk.reset_view = Some(Hotkey::new(Modifier::None, 't'));
    assert_eq!(
        hk.find_conflict(),
        Some((HotkeyName::TimeMode, HotkeyName::ResetView))
    );
    hk.reset_defaults();
    assert_eq!(hk, Hotkeys::default());
}

#[test]
fn unbound_action_never_fires() {
    let mut hk = Hotkeys::default();
    hk.channel_mode = None;
    assert_eq!(hk.action_for(&Hotkey::new(Modifier::None, 'C')), None);
}
