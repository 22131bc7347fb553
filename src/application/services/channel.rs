use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::models::{ChannelConfig, ChannelType, DeliveryContent};

#[async_trait]
pub trait ChannelSender: Send + Sync {
    fn channel(&self) -> ChannelType;

    /// Deliver `content` to one address. Callers filter out recipients with
    /// no address for this channel before getting here.
    async fn send(
        &self,
        config: &ChannelConfig,
        address: &str,
        content: &DeliveryContent,
    ) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct ChannelGateway {
    senders: HashMap<ChannelType, Arc<dyn ChannelSender>>,
}

impl ChannelGateway {
    pub fn new(senders: Vec<Arc<dyn ChannelSender>>) -> Self {
        let mut map = HashMap::new();
        for sender in senders {
            map.insert(sender.channel(), sender);
        }
        Self { senders: map }
    }

    pub fn get(&self, channel: ChannelType) -> Option<Arc<dyn ChannelSender>> {
        self.senders.get(&channel).cloned()
    }
}
