// tests/manager.rs

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{discard, held, LevelDir};
use icethaw::{GameConfig, GameManager, Input, MapError, Sfx};

#[derive(Default)]
struct Recorder(RefCell<Vec<String>>);

impl Sfx for Recorder {
    fn play(&self, id: &str, _volume: f32) {
        self.0.borrow_mut().push(id.to_owned());
    }
}

fn quick_config() -> GameConfig {
    GameConfig {
        win_lock_ticks: 0,
        win_total_ticks: 2,
        ..GameConfig::default()
    }
}

fn manifest(dir: &LevelDir, levels: &[&str]) -> std::path::PathBuf {
    let json = serde_json::json!({
        "levels": levels,
        "config": { "win_lock_ticks": 0, "win_total_ticks": 2 }
    });
    dir.write("game.json", &json.to_string())
}

fn run(manager: &mut GameManager, inputs: &[Input]) {
    manager.iterate(&held(inputs), &mut discard).expect("level change");
}

fn push_right(manager: &mut GameManager) {
    run(manager, &[Input::Right]);
    run(manager, &[Input::Push]);
    for _ in 0..20 {
        run(manager, &[]);
    }
}

#[test]
fn levels_are_played_in_order() -> anyhow::Result<()> {
    let dir = LevelDir::new("manager", 4);
    dir.level("a.json", &["PX.g"]);
    dir.level("b.json", &["PXg"]);
    let sfx = Rc::new(Recorder::default());
    let mut manager = GameManager::load(&manifest(&dir, &["a.json", "b.json"]), dir.images(), sfx.clone())?;

    assert_eq!(manager.level_count(), 2);
    assert_eq!(manager.current_level(), 0);

    push_right(&mut manager);
    assert_eq!(manager.current_level(), 0, "one push is not enough");
    push_right(&mut manager);
    assert_eq!(manager.current_level(), 1);
    assert_eq!(manager.total_pushes(), 2);

    push_right(&mut manager);
    assert!(manager.done());
    assert_eq!(manager.total_pushes(), 3);
    assert_eq!(sfx.0.borrow().iter().filter(|s| *s == "win").count(), 2);

    // iterating a finished game is harmless
    run(&mut manager, &[Input::Push]);
    assert!(manager.done());
    Ok(())
}

#[test]
fn reset_restores_the_level() -> anyhow::Result<()> {
    let dir = LevelDir::new("reset", 4);
    let level = dir.level("a.json", &["PB..g", "X...."]);
    let mut manager = GameManager::from_levels(vec![level], quick_config(), dir.cache(), Rc::new(icethaw::NullSfx))?;

    push_right(&mut manager);
    assert_eq!(manager.game().map(|g| g.pushes()), Some(1));

    run(&mut manager, &[Input::Reset]);
    let game = manager.game().expect("level still running");
    assert_eq!(game.pushes(), 0);
    assert_eq!(game.player_tile(), Some(icethaw::Pos::new(0, 0)));

    // holding Reset does not reload every tick
    push_right(&mut manager);
    run(&mut manager, &[Input::Reset]);
    assert_eq!(manager.game().map(|g| g.pushes()), Some(0));
    run(&mut manager, &[Input::Reset, Input::Right]);
    run(&mut manager, &[Input::Reset, Input::Push]);
    assert_eq!(manager.game().map(|g| g.pushes()), Some(1));
    Ok(())
}

#[test]
fn a_button_held_into_the_next_level_does_not_fire() -> anyhow::Result<()> {
    let dir = LevelDir::new("held", 4);
    let first = dir.level("a.json", &["PXg"]);
    let second = dir.level("b.json", &["P", "B", "."]);
    let config = GameConfig {
        win_lock_ticks: 0,
        win_total_ticks: 50,
        ..GameConfig::default()
    };
    let mut manager = GameManager::from_levels(vec![first, second], config, dir.cache(), Rc::new(icethaw::NullSfx))?;

    run(&mut manager, &[Input::Right]);
    run(&mut manager, &[Input::Push]);
    for _ in 0..10 {
        run(&mut manager, &[]);
    }
    assert!(manager.game().is_some_and(|g| g.won()));

    // confirm the win, then keep the button down on the new level
    run(&mut manager, &[Input::Push]);
    assert_eq!(manager.current_level(), 1);
    run(&mut manager, &[Input::Push]);
    assert_eq!(manager.game().map(|g| g.pushes()), Some(0));

    run(&mut manager, &[]);
    run(&mut manager, &[Input::Push]);
    assert_eq!(manager.game().map(|g| g.pushes()), Some(1));
    Ok(())
}

#[test]
fn reset_with_push_held_does_not_push() -> anyhow::Result<()> {
    let dir = LevelDir::new("reset_held", 4);
    let level = dir.level("a.json", &["P", "B", "."]);
    let mut manager = GameManager::from_levels(vec![level], quick_config(), dir.cache(), Rc::new(icethaw::NullSfx))?;

    run(&mut manager, &[Input::Reset, Input::Push]);
    run(&mut manager, &[Input::Push]);
    assert_eq!(manager.game().map(|g| g.pushes()), Some(0));
    assert!(!manager.game().is_some_and(|g| g.is_stepping()));
    Ok(())
}

#[test]
fn menu_requests_are_reported_once() -> anyhow::Result<()> {
    let dir = LevelDir::new("menu", 4);
    let level = dir.level("a.json", &["P."]);
    let mut manager = GameManager::from_levels(vec![level], quick_config(), dir.cache(), Rc::new(icethaw::NullSfx))?;

    run(&mut manager, &[Input::Menu]);
    assert!(manager.take_menu_request());
    assert!(!manager.take_menu_request());
    Ok(())
}

#[test]
fn previews_are_half_size() -> anyhow::Result<()> {
    let dir = LevelDir::new("preview", 4);
    let a = dir.level("a.json", &["P..."]);
    let b = dir.level("b.json", &["P.", "..", ".."]);
    let mut manager = GameManager::from_levels(vec![a, b], quick_config(), dir.cache(), Rc::new(icethaw::NullSfx))?;

    let thumb = manager.preview(1)?;
    assert_eq!((thumb.rect().w, thumb.rect().h), (4, 6));
    assert!(matches!(manager.preview(2), Err(MapError::InvalidMap(_))));
    assert_eq!(manager.current_level(), 0);
    Ok(())
}

#[test]
fn empty_or_broken_manifests_fail() {
    let dir = LevelDir::new("empty", 4);
    let err = GameManager::load(&manifest(&dir, &[]), dir.images(), Rc::new(icethaw::NullSfx)).err();
    assert!(matches!(err, Some(MapError::InvalidMap(_))));

    let err = GameManager::load(&manifest(&dir, &["missing.json"]), dir.images(), Rc::new(icethaw::NullSfx)).err();
    assert!(matches!(err, Some(MapError::Io { .. })));
}
