//! Interactive chat loop on stdin/stdout.
//!
//! Input and output run independently: lines are read and submitted as they
//! come, while a render task prints new rows whenever the controller publishes
//! a snapshot. A line typed while an answer is outstanding is reported and
//! dropped.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

use sakila_chat::{project, ChatError, ChatSnapshot, Skin, TurnController, TurnHandle};

/// Turns successive snapshots into the lines not yet printed.
pub struct Renderer {
    skin: Box<dyn Skin + Send + Sync>,
    printed: usize,
    working_shown: bool,
    /// Reset count of the last snapshot framed.
    epoch: u64,
}

impl Renderer {
    pub fn new(skin: Box<dyn Skin + Send + Sync>) -> Self {
        Self {
            skin,
            printed: 0,
            working_shown: false,
            epoch: 0,
        }
    }

    /// Rows of `snapshot` that have not been emitted yet.
    ///
    /// After a reset printing starts over from the first message, even when
    /// intermediate snapshots were never framed.
    pub fn frame(&mut self, snapshot: &ChatSnapshot) -> Vec<String> {
        let view = project(self.skin.as_ref(), snapshot);
        let messages = snapshot.messages.len();
        if snapshot.epoch != self.epoch || messages < self.printed {
            self.epoch = snapshot.epoch;
            self.printed = 0;
            self.working_shown = false;
        }

        let mut out: Vec<String> = view.rows[self.printed..messages]
            .iter()
            .map(|row| row.body.clone())
            .collect();
        if messages > self.printed {
            self.working_shown = false;
        }
        self.printed = messages;

        if view.has_working_row() && !self.working_shown {
            if let Some(row) = view.rows.last() {
                out.push(row.body.clone());
            }
            self.working_shown = true;
        }
        out
    }
}

fn emit(lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    let mut stdout = std::io::stdout().lock();
    for line in lines {
        let _ = writeln!(stdout, "{}", line);
    }
    let _ = stdout.flush();
}

async fn render_loop(
    mut renderer: Renderer,
    mut updates: watch::Receiver<ChatSnapshot>,
) -> Renderer {
    while updates.changed().await.is_ok() {
        let snapshot = updates.borrow_and_update().clone();
        emit(&renderer.frame(&snapshot));
    }
    renderer
}

/// Run the chat until end of input or `/quit`.
pub async fn run(
    controller: TurnController,
    skin: Box<dyn Skin + Send + Sync>,
) -> std::io::Result<()> {
    let render = tokio::spawn(render_loop(Renderer::new(skin), controller.subscribe()));

    println!("Ask about films, actors and rentals. /reset starts over, /quit exits.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last: Option<TurnHandle> = None;

    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" | "/exit" => break,
            "/reset" => {
                controller.reset();
                println!("(conversation cleared)");
                continue;
            }
            _ => {}
        }

        controller.set_draft(&line);
        match controller.submit_draft() {
            Ok(handle) => last = Some(handle),
            Err(ChatError::EmptyQuestion) => {}
            Err(ChatError::TurnInFlight) => {
                println!("(still waiting for the previous answer; question ignored)");
                controller.set_draft("");
            }
            Err(e) => {
                tracing::error!(error = %e, "Question not sent");
                break;
            }
        }
    }

    if controller.is_pending() {
        if let Some(handle) = last.take() {
            handle.settled().await;
        }
    }

    let last_snapshot = controller.snapshot();
    controller.close();
    drop(controller);

    match render.await {
        Ok(mut renderer) => emit(&renderer.frame(&last_snapshot)),
        Err(e) => tracing::warn!(error = %e, "Render task failed"),
    }
    Ok(())
}
