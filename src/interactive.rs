use inquire::{Confirm, InquireError};

use crate::error::{Result, SchedulerError};
use crate::scheduler::Action;

/// Show the planned targets and ask before acting. Cancelling the prompt
/// counts as "no".
pub fn confirm_action(action: Action, region: &str, instance_ids: &[String]) -> Result<bool> {
    println!(
        "About to {} {} instance(s) in {}:",
        action,
        instance_ids.len(),
        region
    );
    for id in instance_ids {
        println!("  {}", id);
    }

    match Confirm::new(&format!("Proceed with {}?", action))
        .with_default(false)
        .prompt()
    {
        Ok(answer) => Ok(answer),
        Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => Ok(false),
        Err(InquireError::IO(e)) => Err(SchedulerError::Io(e)),
        Err(e) => Err(SchedulerError::invalid_argument(format!(
            "confirmation prompt unavailable: {}",
            e
        ))),
    }
}
