#[derive(Debug, Clone, Copy)]
pub struct ArenaConfig {
    /// Node slots reserved up front, before the first insertion grows the arena.
    pub initial_capacity: usize,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            initial_capacity: 256,
        }
    }
}
