//! ASCII level cells shared by the unit and integration test fixtures.
//!
//! `.` floor, `~` ice, `#` wall, `g` goal floor, `B` block, `I` block on ice,
//! `X` goal block, `O` goal block on a goal floor, `P` player, `Q` player on ice.

pub const FLOOR: u32 = 1;
pub const ICE: u32 = 2;
pub const WALL: u32 = 3;
pub const GOAL: u32 = 4;
pub const BLOCK: u32 = 5;
pub const GOAL_BLOCK: u32 = 6;
pub const PLAYER: u32 = 7;
pub const TILES: u32 = 7;

/// Boolean properties of the fixture tileset, by gid.
pub const FLAGS: &[(u32, &[&str])] = &[
    (ICE, &["slippery_player", "slippery_block"]),
    (WALL, &["collision"]),
    (GOAL, &["goal"]),
    (GOAL_BLOCK, &["goal"]),
];

/// Gids placed on the floor, blocks and player layers.
pub fn cell(c: char) -> (u32, u32, u32) {
    match c {
        '.' => (FLOOR, 0, 0),
        '~' => (ICE, 0, 0),
        '#' => (WALL, 0, 0),
        'g' => (GOAL, 0, 0),
        'B' => (FLOOR, BLOCK, 0),
        'I' => (ICE, BLOCK, 0),
        'X' => (FLOOR, GOAL_BLOCK, 0),
        'O' => (GOAL, GOAL_BLOCK, 0),
        'P' => (FLOOR, 0, PLAYER),
        'Q' => (ICE, 0, PLAYER),
        other => panic!("unknown level cell '{other}'"),
    }
}

/// Level data split into `(width, height, [floor, blocks, player])`.
pub fn layers(rows: &[&str]) -> (usize, usize, [Vec<u32>; 3]) {
    let width = rows[0].chars().count();
    let mut data = [Vec::new(), Vec::new(), Vec::new()];
    for row in rows {
        assert_eq!(row.chars().count(), width, "ragged level row");
        for c in row.chars() {
            let (f, b, p) = cell(c);
            data[0].push(f);
            data[1].push(b);
            data[2].push(p);
        }
    }
    (width, rows.len(), data)
}

/// RGBA bytes of a one-row atlas of `TILES` tiles; tile `n` is filled with red `n * 30`.
pub fn atlas(tile: usize) -> Vec<u8> {
    let w = tile * TILES as usize;
    let mut bytes = Vec::with_capacity(w * tile * 4);
    for _y in 0..tile {
        for x in 0..w {
            let n = (x / tile) as u8 + 1;
            bytes.extend_from_slice(&[n * 30, 0x40, 0, 0xff]);
        }
    }
    bytes
}
