use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, info, instrument, warn};

use crate::error::{SyncError, WalletError};
use crate::identity::Identity;
use crate::provider::WalletProvider;

pub type TransitionHook = Rc<dyn Fn(&SessionState)>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connecting,
    Connected(Identity),
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Connected(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected(_) => "connected",
        }
    }
}

/// Proof that work was started under a particular session. Any later transition
/// invalidates it, including a reconnect to the same address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTicket {
    pub identity: Identity,
    epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected(Identity),
    AlreadyConnected(Identity),
    /// Another `connect()` is awaiting the wallet; this call did nothing.
    AlreadyConnecting,
    /// The session was ended locally while the prompt was open; the approval was
    /// ignored.
    Abandoned,
}

pub struct SessionManager {
    wallet: Rc<dyn WalletProvider>,
    state: RefCell<SessionState>,
    epoch: Cell<u64>,
    hook: RefCell<Option<TransitionHook>>,
}

impl SessionManager {
    pub fn new(wallet: Rc<dyn WalletProvider>) -> Self {
        Self {
            wallet,
            state: RefCell::new(SessionState::Disconnected),
            epoch: Cell::new(0),
            hook: RefCell::new(None),
        }
    }

    pub fn wallet(&self) -> &dyn WalletProvider {
        self.wallet.as_ref()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    pub fn ticket(&self) -> Option<SessionTicket> {
        self.identity().map(|identity| SessionTicket {
            identity,
            epoch: self.epoch.get(),
        })
    }

    pub fn is_current(&self, ticket: &SessionTicket) -> bool {
        self.epoch.get() == ticket.epoch
    }

    /// Called after every completed transition with the new state.
    pub fn set_transition_hook(&self, hook: Option<TransitionHook>) {
        *self.hook.borrow_mut() = hook;
    }

    /// Adopts an account the wallet has already authorized, without prompting.
    /// Every failure is silent: this runs unconditionally at start-up.
    #[instrument(skip(self))]
    pub async fn restore_session(&self) -> Option<Identity> {
        if !matches!(self.state(), SessionState::Disconnected) {
            debug!("session already active; skipping restore");
            return None;
        }

        let accounts = match self.wallet.authorized_accounts().await {
            Ok(accounts) => accounts,
            Err(WalletError::Unavailable) => {
                debug!("no wallet provider; staying disconnected");
                return None;
            }
            Err(err) => {
                warn!(error = %err, "could not query authorized accounts");
                return None;
            }
        };

        let Some(first) = accounts.into_iter().next() else {
            debug!("no account authorized for this site");
            return None;
        };

        if !matches!(self.state(), SessionState::Disconnected) {
            debug!("session changed while restoring; keeping it");
            return None;
        }

        self.transition(SessionState::Connected(first.clone()));
        Some(first)
    }

    /// Prompts the wallet for accounts. Re-entrant calls while a prompt is open are
    /// no-ops.
    #[instrument(skip(self))]
    pub async fn connect(&self) -> Result<ConnectOutcome, SyncError> {
        match self.state() {
            SessionState::Connecting => {
                debug!("connect already in flight");
                return Ok(ConnectOutcome::AlreadyConnecting);
            }
            SessionState::Connected(identity) => {
                debug!(identity = %identity, "already connected");
                return Ok(ConnectOutcome::AlreadyConnected(identity));
            }
            SessionState::Disconnected => {}
        }

        self.transition(SessionState::Connecting);
        let attempt = ConnectAttempt {
            manager: self,
            epoch: self.epoch.get(),
        };

        let accounts = match self.wallet.request_accounts().await {
            Ok(accounts) => accounts,
            Err(err) if !attempt.is_live() => {
                info!(error = %err, "session ended while the wallet prompt was open");
                return Ok(ConnectOutcome::Abandoned);
            }
            Err(err) => {
                warn!(error = %err, "account request failed");
                return Err(SyncError::from_connect(err));
            }
        };

        if !attempt.is_live() {
            info!("session ended while the wallet prompt was open");
            return Ok(ConnectOutcome::Abandoned);
        }

        let Some(first) = accounts.into_iter().next() else {
            warn!("wallet approved but returned no accounts");
            return Err(SyncError::NoAccounts);
        };

        self.transition(SessionState::Connected(first.clone()));
        Ok(ConnectOutcome::Connected(first))
    }

    /// Local sign-out. Returns the identity that was active, if any.
    #[instrument(skip(self))]
    pub fn disconnect(&self) -> Option<Identity> {
        let previous = self.identity();
        if !matches!(self.state(), SessionState::Disconnected) {
            self.transition(SessionState::Disconnected);
        }
        previous
    }

    /// Wallet-side account switch. Anything other than the current account staying
    /// first ends the session.
    #[instrument(skip(self, accounts), fields(count = accounts.len()))]
    pub fn handle_accounts_changed(&self, accounts: &[Identity]) -> Option<Identity> {
        let SessionState::Connected(current) = self.state() else {
            return None;
        };
        if accounts.first() == Some(&current) {
            debug!("active account unchanged");
            return None;
        }
        info!(previous = %current, next = ?accounts.first().map(Identity::as_str), "wallet switched accounts; ending session");
        self.transition(SessionState::Disconnected);
        Some(current)
    }

    #[instrument(skip(self))]
    pub fn handle_chain_changed(&self) -> Option<Identity> {
        let SessionState::Connected(current) = self.state() else {
            return None;
        };
        info!(previous = %current, "wallet switched networks; ending session");
        self.transition(SessionState::Disconnected);
        Some(current)
    }

    fn transition(&self, next: SessionState) {
        let previous = self.state.replace(next.clone());
        self.epoch.set(self.epoch.get().wrapping_add(1));
        info!(
            from = previous.label(),
            to = next.label(),
            identity = ?next.identity().map(Identity::as_str),
            "session transition"
        );

        let hook = self.hook.borrow().clone();
        if let Some(hook) = hook {
            hook(&next);
        }
    }
}

/// Puts the session back to `Disconnected` if a connect attempt ends without another
/// transition, whether it returned early, failed, or was dropped mid-await.
struct ConnectAttempt<'a> {
    manager: &'a SessionManager,
    epoch: u64,
}

impl ConnectAttempt<'_> {
    fn is_live(&self) -> bool {
        self.manager.epoch.get() == self.epoch
    }
}

impl Drop for ConnectAttempt<'_> {
    fn drop(&mut self) {
        if self.is_live() {
            self.manager.transition(SessionState::Disconnected);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimLedger, SimWallet};

    fn alice() -> Identity {
        Identity::new("0xa11ce00000000000000000000000000000000001")
    }

    fn manager(wallet: &Rc<SimWallet>) -> SessionManager {
        SessionManager::new(wallet.clone())
    }

    #[tokio::test]
    async fn restore_adopts_first_authorized_account() {
        let wallet = Rc::new(SimWallet::new(
            SimLedger::new(),
            vec![alice(), Identity::new("0xb0b")],
        ));
        wallet.set_authorized(true);
        let session = manager(&wallet);

        assert_eq!(session.restore_session().await, Some(alice()));
        assert_eq!(session.state(), SessionState::Connected(alice()));
        assert_eq!(wallet.prompt_count(), 0);
    }

    #[tokio::test]
    async fn restore_is_silent_without_provider_or_authorization() {
        let absent = Rc::new(SimWallet::absent());
        let session = manager(&absent);
        assert_eq!(session.restore_session().await, None);
        assert_eq!(session.state(), SessionState::Disconnected);

        let unauthorized = Rc::new(SimWallet::new(SimLedger::new(), vec![alice()]));
        let session = manager(&unauthorized);
        assert_eq!(session.restore_session().await, None);
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn rejected_connect_returns_to_disconnected() {
        let wallet = Rc::new(SimWallet::new(SimLedger::new(), vec![alice()]));
        wallet.set_prompt_approval(false);
        let session = manager(&wallet);

        let err = session.connect().await.expect_err("prompt rejected");
        assert_eq!(err, SyncError::AccountsDenied);
        assert_eq!(session.state(), SessionState::Disconnected);

        wallet.set_prompt_approval(true);
        let outcome = session.connect().await.expect("second attempt");
        assert_eq!(outcome, ConnectOutcome::Connected(alice()));
        assert_eq!(wallet.prompt_count(), 2);
    }

    #[tokio::test]
    async fn connect_without_provider_reports_unavailable() {
        let wallet = Rc::new(SimWallet::absent());
        let session = manager(&wallet);
        let err = session.connect().await.expect_err("no provider");
        assert_eq!(err, SyncError::ProviderUnavailable);
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn empty_account_list_is_an_authorization_failure() {
        let wallet = Rc::new(SimWallet::new(SimLedger::new(), vec![]));
        let session = manager(&wallet);
        let err = session.connect().await.expect_err("no accounts");
        assert_eq!(err, SyncError::NoAccounts);
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn dropped_connect_future_does_not_leave_connecting() {
        let wallet = Rc::new(SimWallet::new(SimLedger::new(), vec![alice()]));
        let _gate = wallet.hold_prompts();
        let session = manager(&wallet);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        session.set_transition_hook(Some(Rc::new(move |state: &SessionState| {
            sink.borrow_mut().push(state.label());
        })));

        // The prompt is held, so `connect` is polled once and then dropped.
        tokio::select! {
            biased;
            outcome = session.connect() => panic!("prompt should still be open: {outcome:?}"),
            () = std::future::ready(()) => {}
        }

        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(*seen.borrow(), vec!["connecting", "disconnected"]);
    }

    #[tokio::test]
    async fn disconnect_during_prompt_abandons_the_approval() {
        let wallet = Rc::new(SimWallet::new(SimLedger::new(), vec![alice()]));
        let gate = wallet.hold_prompts();
        let session = manager(&wallet);

        let (outcome, ()) = tokio::join!(session.connect(), async {
            session.disconnect();
            gate.notify_one();
        });

        assert_eq!(outcome, Ok(ConnectOutcome::Abandoned));
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn rejection_after_local_disconnect_is_not_an_error() {
        let wallet = Rc::new(SimWallet::new(SimLedger::new(), vec![alice()]));
        wallet.set_prompt_approval(false);
        let gate = wallet.hold_prompts();
        let session = manager(&wallet);

        let (outcome, ()) = tokio::join!(session.connect(), async {
            session.disconnect();
            gate.notify_one();
        });

        assert_eq!(outcome, Ok(ConnectOutcome::Abandoned));
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn account_switch_ends_the_session() {
        let wallet = Rc::new(SimWallet::new(SimLedger::new(), vec![alice()]));
        let session = manager(&wallet);
        session.connect().await.expect("connect");
        let ticket = session.ticket().expect("ticket");

        assert_eq!(session.handle_accounts_changed(&[alice()]), None);
        assert!(session.is_current(&ticket));

        let previous = session.handle_accounts_changed(&[Identity::new("0xb0b")]);
        assert_eq!(previous, Some(alice()));
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(!session.is_current(&ticket));
    }

    #[tokio::test]
    async fn chain_switch_ends_the_session() {
        let wallet = Rc::new(SimWallet::new(SimLedger::new(), vec![alice()]));
        let session = manager(&wallet);
        assert_eq!(session.handle_chain_changed(), None);
        session.connect().await.expect("connect");
        assert_eq!(session.handle_chain_changed(), Some(alice()));
        assert_eq!(session.state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn transition_hook_sees_every_state() {
        let wallet = Rc::new(SimWallet::new(SimLedger::new(), vec![alice()]));
        let session = manager(&wallet);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        session.set_transition_hook(Some(Rc::new(move |state: &SessionState| {
            sink.borrow_mut().push(state.label());
        })));

        session.connect().await.expect("connect");
        session.disconnect();

        assert_eq!(
            *seen.borrow(),
            vec!["connecting", "connected", "disconnected"]
        );
    }
}
