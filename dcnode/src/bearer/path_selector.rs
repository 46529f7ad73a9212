use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Path {
    /// This UE's own radio link.
    Local,
    /// Through the DCX tunnel to the peer UE's radio link.
    Remote,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    #[default]
    Alternate,
    LocalOnly,
    RemoteOnly,
}

#[derive(Debug, Clone)]
pub struct PathSelector {
    use_dual_connectivity: bool,
    policy: SplitPolicy,
    alternate_turn: bool,
}

impl PathSelector {
    pub fn new(use_dual_connectivity: bool, policy: SplitPolicy) -> Self {
        PathSelector {
            use_dual_connectivity,
            policy,
            alternate_turn: false,
        }
    }

    /// Choose the path for the next PDU.  Under `Alternate` the turn flips on every decision
    /// made while dual connectivity is in use.  The fixed policies leave it alone.
    pub fn select_path(&mut self, peer_configured: bool) -> Path {
        if !self.use_dual_connectivity || !peer_configured {
            return Path::Local;
        }
        match self.policy {
            SplitPolicy::Alternate => {
                let path = if self.alternate_turn {
                    Path::Remote
                } else {
                    Path::Local
                };
                self.alternate_turn = !self.alternate_turn;
                path
            }
            SplitPolicy::LocalOnly => Path::Local,
            SplitPolicy::RemoteOnly => Path::Remote,
        }
    }

    pub fn alternate_turn(&self) -> bool {
        self.alternate_turn
    }

    pub fn use_dual_connectivity(&self) -> bool {
        self.use_dual_connectivity
    }
}
