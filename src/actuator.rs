use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    position::ClosurePercent,
    retry::{RetryOutcome, RetryPolicy},
    switchbot::{CurtainClient, CurtainTarget, position_command},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The write completed without error. The motor does not acknowledge
    /// the position, so this does not confirm the curtain actually moved.
    Success { attempts: u32 },

    Failed { attempts: u32 },

    Cancelled { attempts: u32 },
}

impl MoveOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, MoveOutcome::Success { .. })
    }
}

/// Positions curtains through a [`CurtainClient`], retrying failed writes
/// according to its [`RetryPolicy`].
pub struct CurtainActuator<C> {
    client: C,
    policy: RetryPolicy,
}

impl<C: CurtainClient> CurtainActuator<C> {
    pub fn new(client: C, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub async fn move_to(
        &self,
        target: &CurtainTarget,
        closure: ClosurePercent,
        token: &CancellationToken,
    ) -> MoveOutcome {
        info!(curtain = %target, %closure, "moving curtain");

        let command = position_command(closure);
        let max_attempts = self.policy.max_attempts.max(1);

        let outcome = self
            .policy
            .run(token, |attempt| async move {
                let result = self.client.send(target, &command).await;
                if let Err(err) = &result {
                    warn!(
                        curtain = %target.name,
                        "attempt {attempt}/{max_attempts} failed: {err:#}"
                    );
                }
                result
            })
            .await;

        match outcome {
            RetryOutcome::Succeeded { attempts, .. } => {
                info!(curtain = %target.name, attempts, "curtain positioned");
                MoveOutcome::Success { attempts }
            }
            RetryOutcome::Exhausted {
                attempts,
                last_error,
            } => {
                error!(
                    curtain = %target.name,
                    attempts,
                    "curtain unreachable, skipping this cycle: {last_error:#}"
                );
                MoveOutcome::Failed { attempts }
            }
            RetryOutcome::Cancelled { attempts } => {
                warn!(curtain = %target.name, attempts, "curtain move cancelled");
                MoveOutcome::Cancelled { attempts }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use anyhow::{Result, bail};
    use macaddr::MacAddr6;
    use tokio::time::{Duration, Instant};

    use super::*;

    #[derive(Debug, Clone)]
    pub struct SentCommand {
        pub curtain: String,
        pub command: Vec<u8>,
        pub at: Instant,
        pub delivered: bool,
    }

    /// Fails the first N sends to each curtain, then succeeds.
    #[derive(Debug, Clone, Default)]
    pub struct ScriptedClient {
        failures: Arc<Mutex<HashMap<String, u32>>>,
        sent: Arc<Mutex<Vec<SentCommand>>>,
    }

    impl ScriptedClient {
        pub fn failing(self, curtain: &str, times: u32) -> Self {
            self.failures
                .lock()
                .unwrap()
                .insert(curtain.to_string(), times);
            self
        }

        pub fn sent(&self) -> Vec<SentCommand> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl CurtainClient for ScriptedClient {
        async fn send(&self, target: &CurtainTarget, command: &[u8]) -> Result<()> {
            let fail = {
                let mut failures = self.failures.lock().unwrap();
                match failures.get_mut(&target.name) {
                    Some(remaining) if *remaining > 0 => {
                        *remaining -= 1;
                        true
                    }
                    _ => false,
                }
            };

            self.sent.lock().unwrap().push(SentCommand {
                curtain: target.name.clone(),
                command: command.to_vec(),
                at: Instant::now(),
                delivered: !fail,
            });

            if fail {
                bail!("le-connection-abort-by-local");
            }
            Ok(())
        }
    }

    pub fn target(name: &str, last_octet: u8) -> CurtainTarget {
        CurtainTarget::new(name, MacAddr6::new(0xdf, 0x9e, 0x2b, 0xbd, 0x3b, last_octet))
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_two_failures() {
        let client = ScriptedClient::default().failing("Left", 2);
        let actuator = CurtainActuator::new(client.clone(), RetryPolicy::default());
        let closure = ClosurePercent::new(64).unwrap();

        let outcome = actuator
            .move_to(&target("Left", 0x7b), closure, &CancellationToken::new())
            .await;

        assert_eq!(outcome, MoveOutcome::Success { attempts: 3 });

        let sent = client.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[1].at - sent[0].at, Duration::from_secs(2));
        assert_eq!(sent[2].at - sent[1].at, Duration::from_secs(2));
        assert!(sent[2].delivered);
        assert_eq!(sent[2].command, position_command(closure));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_three_failures() {
        let client = ScriptedClient::default().failing("Right", 3);
        let actuator = CurtainActuator::new(client.clone(), RetryPolicy::default());

        let outcome = actuator
            .move_to(
                &target("Right", 0xc2),
                ClosurePercent::HALF,
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(outcome, MoveOutcome::Failed { attempts: 3 });
        assert!(client.sent().iter().all(|s| !s.delivered));
    }

    #[tokio::test]
    async fn first_attempt_success_does_not_retry() {
        let client = ScriptedClient::default();
        let actuator = CurtainActuator::new(client.clone(), RetryPolicy::default());

        let outcome = actuator
            .move_to(
                &target("Left", 0x7b),
                ClosurePercent::OPEN,
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(outcome, MoveOutcome::Success { attempts: 1 });
        assert_eq!(client.sent().len(), 1);
    }
}
