//! # Unjail Processing
//!
//! [`Keeper::process_unjail`] applies one decoded `Unjail` event.
//!
//! ## Atomicity
//!
//! Every step runs against a [`CacheView`] over the host store. The view
//! holds the only mutable borrow of the store for the whole request, so
//! nothing else can observe partial writes. Exactly one of the following
//! happens per request:
//!
//! - success: the view is committed and no event is emitted;
//! - failure: the view is discarded and one audit event is emitted on the
//!   host's sink.
//!
//! A panic anywhere in the steps, or while committing, is caught at this
//! boundary and reported as `InternalFault`.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use evmstaking_core::{ErrorCode, UnjailRequest};
use evmstaking_state::{CacheView, KvStore, LivenessSubsystem, OperatorRegistry};

use crate::audit::{AuditEvent, EventAttribute, EventSink};
use crate::authorization::{authorize, AuthorizationPath};
use crate::classify::classify_liveness_error;
use crate::config::KeeperConfig;
use crate::contract_log::{decode_unjail_log, EvmLog, LogDecodeError};
use crate::error::UnjailError;
use crate::identity::translate_identity;

/// Result of processing one unjail request.
#[derive(Debug)]
pub struct ApplicationOutcome {
    /// Whether the validator was unjailed and the writes committed.
    pub success: bool,
    error: Option<UnjailError>,
    /// Attributes of the emitted audit event. Empty on success.
    pub audit_attributes: Vec<EventAttribute>,
}

impl ApplicationOutcome {
    fn succeeded() -> Self {
        Self {
            success: true,
            error: None,
            audit_attributes: Vec::new(),
        }
    }

    fn failed(error: UnjailError, audit_attributes: Vec<EventAttribute>) -> Self {
        Self {
            success: false,
            error: Some(error),
            audit_attributes,
        }
    }

    /// Status code of the failure, if any.
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(UnjailError::code)
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&UnjailError> {
        self.error.as_ref()
    }

    /// Convert into a `Result`, dropping the audit attributes.
    pub fn into_result(self) -> Result<(), UnjailError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Processes unjail events against the consensus-layer state.
#[derive(Debug, Clone)]
pub struct Keeper<R, L> {
    registry: R,
    liveness: L,
    config: KeeperConfig,
}

impl<R, L> Keeper<R, L>
where
    R: OperatorRegistry,
    L: LivenessSubsystem,
{
    /// Create a keeper over the given collaborators.
    pub fn new(registry: R, liveness: L, config: KeeperConfig) -> Self {
        Self {
            registry,
            liveness,
            config,
        }
    }

    pub fn config(&self) -> &KeeperConfig {
        &self.config
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn liveness(&self) -> &L {
        &self.liveness
    }

    /// Decode a staking contract log into a request processed at `block_height`.
    pub fn parse_unjail_log(
        &self,
        log: &EvmLog,
        block_height: i64,
    ) -> Result<UnjailRequest, LogDecodeError> {
        decode_unjail_log(log, block_height, &self.config)
    }

    /// Apply `request` atomically to `store`.
    ///
    /// On failure the store is left exactly as it was and one audit event
    /// is emitted on `sink`. Panics raised by the registry, the liveness
    /// subsystem or the store are caught and reported as `InternalFault`.
    ///
    /// Catching a panic does not silence it: the process-wide panic hook
    /// still runs first, and the default hook prints the panic message to
    /// stderr. Hosts that want caught faults reported only through
    /// `tracing` should install their own hook with
    /// [`std::panic::set_hook`].
    pub fn process_unjail(
        &self,
        store: &mut dyn KvStore,
        sink: &mut dyn EventSink,
        request: &UnjailRequest,
    ) -> ApplicationOutcome {
        tracing::debug!(
            block_height = request.block_height,
            tx_hash = %request.tx_hash,
            sender = %request.unjailer,
            pubkey = %request.pubkey_hex(),
            "unjail request received"
        );
        match self.apply_atomically(store, request) {
            Ok(path) => {
                tracing::info!(
                    block_height = request.block_height,
                    tx_hash = %request.tx_hash,
                    sender = %request.unjailer,
                    path = ?path,
                    "validator unjailed"
                );
                ApplicationOutcome::succeeded()
            }
            Err(err) => {
                let code = err.code();
                let event =
                    AuditEvent::unjail_failure(&self.config.failure_event_type, request, code);
                tracing::warn!(
                    block_height = request.block_height,
                    tx_hash = %request.tx_hash,
                    sender = %request.unjailer,
                    status_code = %code,
                    error = %err,
                    "unjail failed"
                );
                let attributes = event.attributes.clone();
                sink.emit(event);
                ApplicationOutcome::failed(err, attributes)
            }
        }
    }

    fn apply_atomically(
        &self,
        store: &mut dyn KvStore,
        request: &UnjailRequest,
    ) -> Result<AuthorizationPath, UnjailError> {
        let mut view = CacheView::new(store);

        let applied = panic::catch_unwind(AssertUnwindSafe(|| self.apply(&mut view, request)))
            .unwrap_or_else(|payload| Err(internal_fault(payload)));

        let path = match applied {
            Ok(path) => path,
            Err(err) => {
                let dropped = view.discard();
                tracing::debug!(dropped_writes = dropped, "discarded cached state");
                return Err(err);
            }
        };

        match panic::catch_unwind(AssertUnwindSafe(move || view.commit())) {
            Ok(Ok(written)) => {
                tracing::info!(written, "committed cached state");
                Ok(path)
            }
            Ok(Err(e)) => Err(UnjailError::unclassified("commit cached state", e)),
            Err(payload) => Err(internal_fault(payload)),
        }
    }

    fn apply(
        &self,
        view: &mut dyn KvStore,
        request: &UnjailRequest,
    ) -> Result<AuthorizationPath, UnjailError> {
        let identity = translate_identity(&request.validator_uncmp_pubkey)?;
        let path = authorize(&self.registry, view, &identity, &request.unjailer)?;
        tracing::debug!(
            validator = %identity.consensus_address,
            path = ?path,
            "unjail authorized"
        );
        self.liveness
            .unjail(view, &identity.consensus_address)
            .map_err(classify_liveness_error)?;
        Ok(path)
    }
}

fn internal_fault(payload: Box<dyn Any + Send>) -> UnjailError {
    let message = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %message, "caught panic while processing unjail request");
    UnjailError::InternalFault(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{EventManager, ATTRIBUTE_KEY_STATUS_CODE};
    use evmstaking_core::{ConsensusAddress, ExecutionAddress, TxHash};
    use evmstaking_crypto::{derive_uncompressed_pubkey, ValidatorIdentity};
    use evmstaking_state::{
        DelegatorOperatorRegistry, LivenessError, MemStore, SlashingKeeper, StoreError,
        ValidatorRecord, WriteBatch,
    };

    const SEED: [u8; 32] = [0x21; 32];

    fn pubkey() -> [u8; 65] {
        derive_uncompressed_pubkey(&SEED).unwrap()
    }

    fn identity() -> ValidatorIdentity {
        ValidatorIdentity::from_uncompressed(&pubkey()).unwrap()
    }

    fn jailed_store(until: i64, height: i64) -> MemStore {
        let mut store = MemStore::new(height);
        let id = identity();
        SlashingKeeper
            .set_validator(&mut store, &ValidatorRecord::new(id.consensus_address, 10))
            .unwrap();
        SlashingKeeper.jail(&mut store, &id.consensus_address, until).unwrap();
        store
    }

    fn request(sender: ExecutionAddress, height: i64) -> UnjailRequest {
        UnjailRequest::new(height, pubkey().to_vec(), sender, TxHash::from_bytes([0xab; 32]))
    }

    fn keeper() -> Keeper<DelegatorOperatorRegistry, SlashingKeeper> {
        Keeper::new(DelegatorOperatorRegistry, SlashingKeeper, KeeperConfig::default())
    }

    struct PanickingLiveness;

    impl LivenessSubsystem for PanickingLiveness {
        fn unjail(
            &self,
            _store: &mut dyn KvStore,
            _address: &ConsensusAddress,
        ) -> Result<(), LivenessError> {
            panic!("liveness exploded")
        }
    }

    /// Writes a marker key, then fails.
    struct WriteThenFail;

    impl LivenessSubsystem for WriteThenFail {
        fn unjail(
            &self,
            store: &mut dyn KvStore,
            address: &ConsensusAddress,
        ) -> Result<(), LivenessError> {
            store.set(b"partial", b"write".to_vec())?;
            Err(LivenessError::NotJailed(*address))
        }
    }

    /// Accepts reads and writes, refuses to apply a batch.
    struct CommitRejectingStore(MemStore);

    impl KvStore for CommitRejectingStore {
        fn block_height(&self) -> i64 {
            self.0.block_height()
        }
        fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
            self.0.get(key)
        }
        fn set(&mut self, key: &[u8], value: Vec<u8>) -> Result<(), StoreError> {
            self.0.set(key, value)
        }
        fn delete(&mut self, key: &[u8]) -> Result<(), StoreError> {
            self.0.delete(key)
        }
        fn write_batch(&mut self, _batch: WriteBatch) -> Result<(), StoreError> {
            Err(StoreError::Backend("read-only".into()))
        }
    }

    #[test]
    fn test_self_unjail_commits_without_event() {
        let mut store = jailed_store(10, 10);
        let mut events = EventManager::new();
        let outcome = keeper().process_unjail(
            &mut store,
            &mut events,
            &request(identity().execution_address, 10),
        );
        assert!(outcome.success);
        assert!(outcome.error().is_none());
        assert!(outcome.audit_attributes.is_empty());
        assert!(events.is_empty());
        assert!(!SlashingKeeper.is_jailed(&store, &identity().consensus_address).unwrap());
    }

    #[test]
    fn test_still_jailed_discards_and_emits() {
        let mut store = jailed_store(10, 9);
        let before = store.clone();
        let mut events = EventManager::new();
        let outcome = keeper().process_unjail(
            &mut store,
            &mut events,
            &request(identity().execution_address, 9),
        );
        assert!(!outcome.success);
        assert_eq!(outcome.error_code(), Some(ErrorCode::StillJailed));
        assert_eq!(store, before);
        assert_eq!(events.len(), 1);
        assert_eq!(events.events()[0].event_type, "unjail_failure");
        assert_eq!(
            events.events()[0].attribute(ATTRIBUTE_KEY_STATUS_CODE),
            Some("validator_still_jailed")
        );
        assert_eq!(outcome.audit_attributes, events.events()[0].attributes);
    }

    #[test]
    fn test_custom_failure_event_type() {
        let config = KeeperConfig {
            failure_event_type: "custom_failure".into(),
            ..KeeperConfig::default()
        };
        let keeper = Keeper::new(DelegatorOperatorRegistry, SlashingKeeper, config);
        let mut store = MemStore::new(1);
        let mut events = EventManager::new();
        keeper.process_unjail(
            &mut store,
            &mut events,
            &request(identity().execution_address, 1),
        );
        assert_eq!(events.events()[0].event_type, "custom_failure");
    }

    #[test]
    fn test_panic_is_internal_fault() {
        let keeper = Keeper::new(DelegatorOperatorRegistry, PanickingLiveness, KeeperConfig::default());
        let mut store = jailed_store(1, 5);
        let before = store.clone();
        let mut events = EventManager::new();
        let outcome = keeper.process_unjail(
            &mut store,
            &mut events,
            &request(identity().execution_address, 5),
        );
        assert_eq!(outcome.error_code(), Some(ErrorCode::InternalFault));
        assert_eq!(
            outcome.error().unwrap().to_string(),
            "panic caused by liveness exploded"
        );
        assert_eq!(store, before);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_partial_write_is_discarded() {
        let keeper = Keeper::new(DelegatorOperatorRegistry, WriteThenFail, KeeperConfig::default());
        let mut store = jailed_store(1, 5);
        let before = store.clone();
        let mut events = EventManager::new();
        let outcome = keeper.process_unjail(
            &mut store,
            &mut events,
            &request(identity().execution_address, 5),
        );
        assert_eq!(outcome.error_code(), Some(ErrorCode::NotJailed));
        assert_eq!(store.get(b"partial").unwrap(), None);
        assert_eq!(store, before);
    }

    #[test]
    fn test_commit_failure_is_unclassified() {
        let mut store = CommitRejectingStore(jailed_store(1, 5));
        let mut events = EventManager::new();
        let outcome = keeper().process_unjail(
            &mut store,
            &mut events,
            &request(identity().execution_address, 5),
        );
        assert_eq!(outcome.error_code(), Some(ErrorCode::Unclassified));
        assert!(SlashingKeeper.is_jailed(&store.0, &identity().consensus_address).unwrap());
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_invalid_pubkey_emits_raw_key() {
        let mut store = MemStore::new(3);
        let mut events = EventManager::new();
        let bad = UnjailRequest::new(
            3,
            vec![0x05; 65],
            ExecutionAddress::ZERO,
            TxHash::from_bytes([0; 32]),
        );
        let outcome = keeper().process_unjail(&mut store, &mut events, &bad);
        assert_eq!(outcome.error_code(), Some(ErrorCode::InvalidPublicKey));
        assert_eq!(
            events.events()[0].attribute("validator_uncmp_pubkey"),
            Some("05".repeat(65).as_str())
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_into_result() {
        let mut store = MemStore::new(3);
        let mut events = EventManager::new();
        let outcome = keeper().process_unjail(
            &mut store,
            &mut events,
            &request(identity().execution_address, 3),
        );
        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidatorNotFound);
    }

    #[test]
    fn test_internal_fault_payloads() {
        let from_str = internal_fault(Box::new("static"));
        let from_string = internal_fault(Box::new(String::from("owned")));
        let opaque = internal_fault(Box::new(42u32));
        assert_eq!(from_str.to_string(), "panic caused by static");
        assert_eq!(from_string.to_string(), "panic caused by owned");
        assert_eq!(opaque.code(), ErrorCode::InternalFault);
    }

    // ── Logging ──────────────────────────────────────────────────────

    type Records = std::sync::Arc<std::sync::Mutex<Vec<(tracing::Level, String)>>>;

    /// Records the level and message of every event.
    struct Recorder(Records);

    struct MessageVisitor(String);

    impl tracing::field::Visit for MessageVisitor {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    impl tracing::Subscriber for Recorder {
        fn enabled(&self, _: &tracing::Metadata<'_>) -> bool {
            true
        }
        fn new_span(&self, _: &tracing::span::Attributes<'_>) -> tracing::span::Id {
            tracing::span::Id::from_u64(1)
        }
        fn record(&self, _: &tracing::span::Id, _: &tracing::span::Record<'_>) {}
        fn record_follows_from(&self, _: &tracing::span::Id, _: &tracing::span::Id) {}
        fn event(&self, event: &tracing::Event<'_>) {
            let mut visitor = MessageVisitor(String::new());
            event.record(&mut visitor);
            if let Ok(mut records) = self.0.lock() {
                records.push((*event.metadata().level(), visitor.0));
            }
        }
        fn enter(&self, _: &tracing::span::Id) {}
        fn exit(&self, _: &tracing::span::Id) {}
    }

    fn logged(f: impl FnOnce()) -> Vec<(tracing::Level, String)> {
        let records = Records::default();
        tracing::subscriber::with_default(Recorder(records.clone()), f);
        let logged = records.lock().unwrap().clone();
        logged
    }

    fn has(records: &[(tracing::Level, String)], level: tracing::Level, message: &str) -> bool {
        records.iter().any(|(l, m)| *l == level && m == message)
    }

    #[test]
    fn test_success_logs_receipt_authorization_and_commit() {
        let records = logged(|| {
            let mut store = jailed_store(10, 10);
            let mut events = EventManager::new();
            keeper().process_unjail(
                &mut store,
                &mut events,
                &request(identity().execution_address, 10),
            );
        });
        assert!(has(&records, tracing::Level::DEBUG, "unjail request received"));
        assert!(has(&records, tracing::Level::DEBUG, "unjail authorized"));
        assert!(has(&records, tracing::Level::INFO, "committed cached state"));
        assert!(!records.iter().any(|(l, _)| *l == tracing::Level::ERROR));
    }

    #[test]
    fn test_caught_panic_logs_error() {
        let records = logged(|| {
            let keeper =
                Keeper::new(DelegatorOperatorRegistry, PanickingLiveness, KeeperConfig::default());
            let mut store = jailed_store(1, 5);
            let mut events = EventManager::new();
            keeper.process_unjail(
                &mut store,
                &mut events,
                &request(identity().execution_address, 5),
            );
        });
        assert!(has(
            &records,
            tracing::Level::ERROR,
            "caught panic while processing unjail request"
        ));
        assert!(has(&records, tracing::Level::WARN, "unjail failed"));
    }

    #[test]
    fn test_ordinary_rejection_does_not_log_error() {
        let records = logged(|| {
            let mut store = jailed_store(10, 9);
            let mut events = EventManager::new();
            keeper().process_unjail(
                &mut store,
                &mut events,
                &request(identity().execution_address, 9),
            );
        });
        assert!(has(&records, tracing::Level::WARN, "unjail failed"));
        assert!(!records.iter().any(|(l, _)| *l == tracing::Level::ERROR));
    }
}
