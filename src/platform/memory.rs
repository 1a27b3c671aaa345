//! In-memory platform used by tests. Records every mutation in order.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{ItemAttributes, ItemKind, PlatformClient, PlatformError, PlatformItem, PlatformResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Created { kind: ItemKind, name: String, color: Option<u32> },
    Deleted { kind: ItemKind, id: u64 },
    Sent { channel_id: u64, text: String },
}

#[derive(Default)]
struct State {
    items: HashMap<(u64, ItemKind), Vec<PlatformItem>>,
    calls: Vec<(Instant, Call)>,
    failing_names: HashSet<String>,
    failing_ids: HashSet<u64>,
    next_id: u64,
}

pub(crate) struct MemoryPlatform {
    state: Mutex<State>,
    bot_top_position: u16,
}

impl MemoryPlatform {
    /// Platform holding one empty guild.
    pub(crate) fn with_guild(guild_id: u64) -> Self {
        let mut state = State {
            next_id: 1000,
            ..State::default()
        };
        for kind in [ItemKind::Channel, ItemKind::Role, ItemKind::Member] {
            state.items.insert((guild_id, kind), Vec::new());
        }
        Self {
            state: Mutex::new(state),
            bot_top_position: 10,
        }
    }

    pub(crate) fn bot_top_position(mut self, position: u16) -> Self {
        self.bot_top_position = position;
        self
    }

    pub(crate) fn add_item(&self, guild_id: u64, kind: ItemKind, item: PlatformItem) {
        let mut state = self.state.lock().unwrap();
        state.items.entry((guild_id, kind)).or_default().push(item);
    }

    pub(crate) fn fail_name(&self, name: &str) {
        self.state.lock().unwrap().failing_names.insert(name.to_string());
    }

    pub(crate) fn fail_id(&self, id: u64) {
        self.state.lock().unwrap().failing_ids.insert(id);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.iter().map(|(_, c)| c.clone()).collect()
    }

    pub(crate) fn call_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().calls.iter().map(|(t, _)| *t).collect()
    }

    pub(crate) fn items(&self, guild_id: u64, kind: ItemKind) -> Vec<PlatformItem> {
        self.state
            .lock()
            .unwrap()
            .items
            .get(&(guild_id, kind))
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn sent(&self) -> Vec<(u64, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Sent { channel_id, text } => Some((channel_id, text)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl PlatformClient for MemoryPlatform {
    async fn list_items(&self, guild_id: u64, kind: ItemKind) -> PlatformResult<Vec<PlatformItem>> {
        self.state
            .lock()
            .unwrap()
            .items
            .get(&(guild_id, kind))
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(format!("Unknown guild {}", guild_id)))
    }

    async fn bot_top_role_position(&self, _guild_id: u64) -> PlatformResult<u16> {
        Ok(self.bot_top_position)
    }

    async fn create_item(
        &self,
        guild_id: u64,
        kind: ItemKind,
        name: &str,
        attributes: &ItemAttributes,
    ) -> PlatformResult<u64> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((
            Instant::now(),
            Call::Created {
                kind,
                name: name.to_string(),
                color: attributes.color,
            },
        ));
        if state.failing_names.contains(name) {
            return Err(PlatformError::Rejected(format!("cannot create {}", name)));
        }
        state.next_id += 1;
        let id = state.next_id;
        let item = PlatformItem {
            id,
            name: name.to_string(),
            position: Some(1),
            actionable: true,
            accepts_messages: kind == ItemKind::Channel,
        };
        state
            .items
            .get_mut(&(guild_id, kind))
            .ok_or_else(|| PlatformError::NotFound(format!("Unknown guild {}", guild_id)))?
            .push(item);
        Ok(id)
    }

    async fn delete_item(&self, guild_id: u64, kind: ItemKind, id: u64) -> PlatformResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((Instant::now(), Call::Deleted { kind, id }));
        if state.failing_ids.contains(&id) {
            return Err(PlatformError::Rejected(format!("cannot delete {}", id)));
        }
        let items = state
            .items
            .get_mut(&(guild_id, kind))
            .ok_or_else(|| PlatformError::NotFound(format!("Unknown guild {}", guild_id)))?;
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Err(PlatformError::NotFound(format!("Unknown {} {}", kind, id)));
        }
        Ok(())
    }

    async fn send_message(&self, channel_id: u64, text: &str) -> PlatformResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((
            Instant::now(),
            Call::Sent {
                channel_id,
                text: text.to_string(),
            },
        ));
        if state.failing_ids.contains(&channel_id) {
            return Err(PlatformError::Rejected(format!("cannot send to {}", channel_id)));
        }
        Ok(())
    }
}
