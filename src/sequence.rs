/// Orders overlapping leaderboard requests. A response is applied only if it
/// belongs to a request issued after the one last applied.
#[derive(Debug, Default)]
pub struct ResponseSequencer {
    issued: u64,
    applied: u64,
}

impl ResponseSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn accept(&mut self, seq: u64) -> bool {
        if seq <= self.applied || seq > self.issued {
            return false;
        }
        self.applied = seq;
        true
    }

    pub fn last_applied(&self) -> Option<u64> {
        (self.applied > 0).then_some(self.applied)
    }
}
