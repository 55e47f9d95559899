//! Command facade
//!
//! Validates textual inputs, dispatches to the session and the scan engine
//! and flattens every failure to the permissive `false` / `0` / empty
//! contract of the command surface. Each flattened error is logged.

use super::protocol::{AttachTarget, Command, CommandOutput};
use crate::config::{Config, ProtocolConfig};
use crate::core::types::{
    parse_offset, Address, MemoryError, MemoryResult, NumericType, ProcessEntry, ProcessId,
    ResultEntry, TypedValue,
};
use crate::memory::{read_value, write_value, ScanEngine, ScanOptions};
use crate::process::{ProcessApi, ProcessSession};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

/// Address handling of the command surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacadeOptions {
    /// Reject malformed addresses instead of treating them as 0
    pub strict_addresses: bool,
    /// Upper search bound when `endAddr` is omitted
    pub default_end_address: Address,
}

impl Default for FacadeOptions {
    fn default() -> Self {
        FacadeOptions {
            strict_addresses: false,
            default_end_address: Address::new(0x7FFF_FFFF_FFFF),
        }
    }
}

impl TryFrom<&ProtocolConfig> for FacadeOptions {
    type Error = MemoryError;

    fn try_from(config: &ProtocolConfig) -> MemoryResult<Self> {
        let default_end_address = config
            .end_address()
            .map_err(|_| MemoryError::InvalidAddress(config.default_end_address.clone()))?;
        Ok(FacadeOptions {
            strict_addresses: config.strict_addresses,
            default_end_address,
        })
    }
}

/// The engine's callable surface
pub struct CommandFacade<A: ProcessApi> {
    session: RwLock<ProcessSession<A>>,
    engine: ScanEngine,
    options: FacadeOptions,
}

impl<A: ProcessApi> CommandFacade<A> {
    pub fn new(api: Arc<A>, scan: ScanOptions, options: FacadeOptions) -> MemoryResult<Self> {
        Ok(CommandFacade {
            session: RwLock::new(ProcessSession::open(api)),
            engine: ScanEngine::new(scan)?,
            options,
        })
    }

    pub fn from_config(api: Arc<A>, config: &Config) -> MemoryResult<Self> {
        let options = FacadeOptions::try_from(&config.protocol)?;
        Self::new(api, ScanOptions::from(&config.scanner), options)
    }

    pub fn engine(&self) -> &ScanEngine {
        &self.engine
    }

    // Scans and I/O share the session; only attachment changes need it
    // exclusively.
    fn session(&self) -> RwLockReadGuard<'_, ProcessSession<A>> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn session_mut(&self) -> RwLockWriteGuard<'_, ProcessSession<A>> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn attach(&self, target: &AttachTarget) -> bool {
        match target {
            AttachTarget::Name { name } => self.attach_by_name(name),
            AttachTarget::Pid { pid } => self.attach_by_id(*pid),
        }
    }

    pub fn attach_by_name(&self, name: &str) -> bool {
        let result = self.session_mut().attach_by_name(name);
        settle("attach", result.map(|_| true), false)
    }

    pub fn attach_by_id(&self, pid: ProcessId) -> bool {
        let result = self.session_mut().attach_by_id(pid);
        settle("attach", result.map(|_| true), false)
    }

    pub fn detach(&self) {
        self.session_mut().detach();
    }

    /// Attachment check with liveness probe; a target that has exited is
    /// detached here
    pub fn is_attached(&self) -> bool {
        self.session_mut().check_alive()
    }

    pub fn pid(&self) -> Option<ProcessId> {
        self.session().pid()
    }

    /// Text summary of the target, empty when detached or unavailable
    pub fn process_info(&self) -> String {
        self.session()
            .process_stats()
            .map(|stats| stats.to_string())
            .unwrap_or_default()
    }

    pub fn list_processes(&self) -> Vec<ProcessEntry> {
        settle("listProcesses", self.session().list_processes(), Vec::new())
    }

    /// Exact or `min~max` search between `start` and `end`.
    ///
    /// `start` defaults to 0 and `end` to the configured upper bound.
    pub fn search_number(
        &self,
        value: &str,
        value_type: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> usize {
        let result = self.try_search_number(value, value_type, start, end);
        settle("searchNumber", result, 0)
    }

    fn try_search_number(
        &self,
        value: &str,
        value_type: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> MemoryResult<usize> {
        let value_type: NumericType = value_type.parse()?;
        let low = match start {
            Some(text) => self.parse_address(text)?,
            None => Address::null(),
        };
        let high = match end {
            Some(text) => self.parse_address(text)?,
            None => self.options.default_end_address,
        };

        let session = self.session();
        self.engine
            .search_exact(&session, value, value_type, low, high)
    }

    /// Refines the current results `offset` (signed hex) bytes away
    pub fn search_nearby(&self, value: &str, value_type: &str, offset: &str) -> usize {
        let result = value_type.parse::<NumericType>().and_then(|value_type| {
            let offset = parse_offset(offset)?;
            let session = self.session();
            self.engine
                .search_nearby(&session, value, value_type, offset)
        });
        settle("searchNearby", result, 0)
    }

    /// Writes `value` at every current result; returns the successful writes
    pub fn edit_all(&self, value: &str, value_type: &str) -> usize {
        let result = parse_typed(value, value_type).and_then(|value| {
            let session = self.session();
            self.engine.edit_all(&session, &value)
        });
        settle("editAll", result, 0)
    }

    pub fn set_value(&self, address: &str, value: &str, value_type: &str) -> bool {
        let result = parse_typed(value, value_type).and_then(|value| {
            let address = self.parse_address(address)?;
            let session = self.session();
            if !session.is_attached() {
                return Err(MemoryError::NotAttached);
            }
            write_value(&session, address, &value)?;
            info!(%address, %value, "Value set");
            Ok(true)
        });
        settle("setValue", result, false)
    }

    /// Current value at `address`, empty when it cannot be read
    pub fn read_value(&self, address: &str, value_type: &str) -> String {
        let result = value_type.parse::<NumericType>().and_then(|value_type| {
            let address = self.parse_address(address)?;
            read_value(&self.session(), address, value_type).map(|v| v.to_string())
        });
        settle("readValue", result, String::new())
    }

    /// First `count` results; non-positive counts yield nothing
    pub fn get_results(&self, count: i64) -> Vec<ResultEntry> {
        self.engine
            .results()
            .prefix(count)
            .iter()
            .map(ResultEntry::from)
            .collect()
    }

    pub fn get_results_count(&self) -> usize {
        self.engine.results().len()
    }

    pub fn clear_results(&self) {
        self.engine.clear();
    }

    /// Runs one decoded command
    pub fn execute(&self, command: Command) -> CommandOutput {
        match command {
            Command::Attach(target) => CommandOutput::Bool(self.attach(&target)),
            Command::Detach => {
                self.detach();
                CommandOutput::Unit
            }
            Command::IsAttached => CommandOutput::Bool(self.is_attached()),
            Command::GetProcessInfo => CommandOutput::Text(self.process_info()),
            Command::ListProcesses => CommandOutput::Processes(self.list_processes()),
            Command::SearchNumber {
                value,
                value_type,
                start_addr,
                end_addr,
            } => CommandOutput::Count(self.search_number(
                &value,
                &value_type,
                start_addr.as_deref(),
                end_addr.as_deref(),
            )),
            Command::SearchNearby {
                value,
                value_type,
                offset,
            } => CommandOutput::Count(self.search_nearby(&value, &value_type, &offset)),
            Command::EditAll { value, value_type } => {
                CommandOutput::Count(self.edit_all(&value, &value_type))
            }
            Command::SetValue {
                address,
                value,
                value_type,
            } => CommandOutput::Bool(self.set_value(&address, &value, &value_type)),
            Command::ReadValue {
                address,
                value_type,
            } => CommandOutput::Text(self.read_value(&address, &value_type)),
            Command::GetResults { count } => CommandOutput::Results(self.get_results(count)),
            Command::GetResultsCount => CommandOutput::Count(self.get_results_count()),
            Command::ClearResults => {
                self.clear_results();
                CommandOutput::Unit
            }
        }
    }

    fn parse_address(&self, text: &str) -> MemoryResult<Address> {
        match text.parse::<Address>() {
            Ok(address) => Ok(address),
            Err(e) if self.options.strict_addresses => Err(e),
            Err(_) => {
                warn!(text, "Malformed address treated as 0x0");
                Ok(Address::parse_lenient(text))
            }
        }
    }
}

impl<A: ProcessApi> std::fmt::Debug for CommandFacade<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandFacade")
            .field("session", &*self.session())
            .field("engine", &self.engine)
            .field("options", &self.options)
            .finish()
    }
}

fn parse_typed(value: &str, value_type: &str) -> MemoryResult<TypedValue> {
    TypedValue::parse(value, value_type.parse()?)
}

fn settle<T>(command: &'static str, result: MemoryResult<T>, fallback: T) -> T {
    result.unwrap_or_else(|e| {
        warn!(command, error = %e, "Command failed");
        fallback
    })
}
