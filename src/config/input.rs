/// Input boundary limits for the lobby forms.
pub const MAX_PLAYER_NAME_LEN: usize = 20;
pub const MAX_ROOM_CODE_LEN: usize = 6;
