//! Commands carried to the presentation thread.
//!
//! Every mutation of window server state arrives as one of these and is
//! applied in the order it was queued.

use std::sync::mpsc::Sender;

use opal_abi::{DrawCommand, GraphicsOp, GraphicsResult, OplResult};

use super::WindowServer;

/// Arbitrary work run against the server, typically for inspection
pub type ServerTask = Box<dyn FnOnce(&mut WindowServer) + Send>;

pub enum ServerCommand {
    Draw {
        commands: Vec<DrawCommand>,
        reply: Sender<OplResult<()>>,
    },
    Graphics {
        op: GraphicsOp,
        reply: Sender<GraphicsResult>,
    },
    Run(ServerTask),
    Shutdown,
}

impl ServerCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Draw { .. } => "draw",
            Self::Graphics { op, .. } => op.name(),
            Self::Run(_) => "run",
            Self::Shutdown => "shutdown",
        }
    }
}

impl core::fmt::Debug for ServerCommand {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "ServerCommand({})", self.name())
    }
}
