use std::process::ExitCode;
use std::sync::Arc;

use teloxide::RequestError;
use tracing::info;
use tracing::instrument;

use crate::bot::BotFacade;
use crate::bot::PollSettings;
use crate::transport::PollRequest;
use crate::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
  Polling { offset: i32 },
  Stopped,
}

impl<T: Transport> BotFacade<T> {
  /// Long-polls until the transport fails, then logs the crash.
  ///
  /// Always returns [`ExitCode::SUCCESS`]; stopping is driven by poll failures only.
  pub async fn run(self: Arc<Self>) -> ExitCode {
    self.log("Started");
    info!(timeout_secs = self.poll.timeout_secs, limit = self.poll.limit, "polling started");

    let mut state = RunState::Polling { offset: 0 };
    while let RunState::Polling { offset } = state {
      state = match self.poll_once(offset).await {
        Ok(next) => RunState::Polling { offset: next },
        Err(err) => {
          self.log(format!("Crash: {err}"));
          RunState::Stopped
        },
      };
    }

    info!("polling stopped");
    ExitCode::SUCCESS
  }

  /// One poll-and-dispatch cycle. Returns the offset for the next cycle.
  #[instrument(skip(self))]
  pub async fn poll_once(self: &Arc<Self>, offset: i32) -> Result<i32, RequestError> {
    let request = PollRequest {
      offset,
      limit: self.poll.limit,
      timeout_secs: self.poll.timeout_secs.min(PollSettings::MAX_TIMEOUT_SECS),
    };
    let updates = self.transport.get_updates(request).await?;

    let mut next = offset;
    for update in updates {
      let after = i32::try_from(update.id).unwrap_or(i32::MAX).saturating_add(1);
      next = next.max(after);
      self.dispatch(update).await;
    }
    Ok(next)
  }
}
