use estate_client::Navigator;

use log::warn;

/// A terminal has no page to leave; tell the user how to sign back in.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn redirect(&self, path: &str) {
        warn!("Session ended by server, sign-in required ({path})");
        eprintln!("Session expired. Sign in again with `estate login --token <TOKEN>`.");
    }
}
