use anyhow::{Context, bail};
use assess_core::model::{ExamId, ExamType, Question, StudentId};
use assess_core::ranking::{LeaderboardEntry, Standing};
use services::session::{RejectReason, SessionProgress};
use services::{AppServices, FlowStage, SessionController, SessionOutcome, StepOutcome};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

type Input = Lines<BufReader<Stdin>>;

fn input() -> Input {
    BufReader::new(tokio::io::stdin()).lines()
}

/// Map "2" to the second option; anything else is taken verbatim.
fn resolve_answer(question: &Question, line: &str) -> String {
    let line = line.trim();
    line.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| question.options().get(i))
        .cloned()
        .unwrap_or_else(|| line.to_string())
}

fn show_question(progress: SessionProgress, question: &Question) {
    println!();
    println!("[{progress}] {}", question.prompt());
    if let Some(context) = question.context() {
        println!("    {context}");
    }
    if question.kind().is_free_text() {
        println!("  (write your answer)");
    }
    for (i, option) in question.options().iter().enumerate() {
        println!("  {}) {option}", i + 1);
    }
}

fn show_step(outcome: &StepOutcome) {
    match outcome {
        StepOutcome::Rejected(RejectReason::NoSelection) => println!("  pick an option first"),
        StepOutcome::Rejected(RejectReason::TooFewWords { required, .. }) => {
            println!("  write at least {required} words");
        }
        StepOutcome::Ticked { remaining } if remaining.as_secs() <= 3 => {
            println!("  {}s left", remaining.as_secs());
        }
        StepOutcome::Graded { record, .. } if record.submission.is_timeout() => {
            println!("  time is up, answer: {}", record.correct_answer);
        }
        StepOutcome::Graded { record, .. } if record.is_correct => println!("  correct"),
        StepOutcome::Graded { record, .. } => {
            println!("  wrong, answer: {}", record.correct_answer);
        }
        _ => {}
    }
}

fn show_outcome(outcome: &SessionOutcome, full_review: bool) {
    let summary = outcome.summary;
    println!();
    println!(
        "Score: {}/{} ({}%) {}",
        summary.score,
        summary.total,
        summary.percentage,
        if summary.passed() { "passed" } else { "not passed" }
    );
    if full_review {
        for record in outcome.review() {
            let mark = if record.is_correct { '+' } else { '-' };
            println!(
                "  {mark} {}: {} (expected {})",
                record.prompt,
                record.submission.display(),
                record.correct_answer
            );
        }
    } else {
        for item in outcome.incorrect() {
            println!("  - {}: {} (you: {})", item.term, item.correct, item.submitted);
        }
    }
}

async fn run_controller(controller: &mut SessionController, lines: &mut Input) -> anyhow::Result<()> {
    if let Some(q) = controller.current_question() {
        show_question(controller.session().progress(), q);
    }

    while !controller.is_finished() {
        let outcome = tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("reading answer")? else {
                    bail!("input closed before the session finished");
                };
                let answer = match controller.current_question() {
                    Some(q) => resolve_answer(q, &line),
                    None => line,
                };
                controller.submit(answer)
            }
            Some(outcome) = controller.next_event() => outcome,
        };

        show_step(&outcome);
        let moved_on = matches!(outcome, StepOutcome::Advanced { .. })
            || matches!(outcome, StepOutcome::Graded { finished: false, .. }
                if !controller.session().is_awaiting_advance());
        if moved_on {
            if let Some(q) = controller.current_question() {
                show_question(controller.session().progress(), q);
            }
        }
    }
    Ok(())
}

pub async fn drill(services: &AppServices, lesson: Option<&str>) -> anyhow::Result<()> {
    let mut controller = services
        .drills()
        .start(lesson)
        .await
        .context("starting drill")?;
    let mut lines = input();
    run_controller(&mut controller, &mut lines).await?;

    if let Some(outcome) = controller.outcome() {
        show_outcome(outcome, false);
    }
    controller.wait_for_report().await;
    Ok(())
}

pub async fn exam(
    services: &AppServices,
    exam_type: ExamType,
    exam: Option<ExamId>,
) -> anyhow::Result<()> {
    let mut flow = services.exam_flow();
    let mut lines = input();

    let exams = flow.select_type(exam_type).await.context("loading exams")?;
    let chosen = match exam {
        Some(id) => id,
        None => {
            for (i, e) in exams.iter().enumerate() {
                println!("  {}) {} ({})", i + 1, e.title, e.year);
            }
            println!("Choose an exam:");
            let line = lines
                .next_line()
                .await?
                .context("input closed before an exam was chosen")?;
            line.trim()
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| exams.get(i))
                .map(|e| e.id)
                .with_context(|| format!("no exam numbered {}", line.trim()))?
        }
    };
    flow.select_exam(chosen).await.context("starting exam")?;

    while matches!(flow.stage(), FlowStage::Active { .. }) {
        let Some(controller) = flow.controller() else {
            break;
        };
        let Some(question) = controller.current_question().cloned() else {
            break;
        };
        show_question(controller.session().progress(), &question);
        let line = lines
            .next_line()
            .await?
            .context("input closed before the exam finished")?;
        let outcome = flow.submit(resolve_answer(&question, &line))?;
        show_step(&outcome);
    }

    if let Some(outcome) = flow.outcome() {
        show_outcome(outcome, true);
    }
    flow.wait_for_report().await;
    Ok(())
}

fn show_board(entries: &[LeaderboardEntry]) {
    for (rank, entry) in entries.iter().enumerate() {
        let types: Vec<_> = entry.exam_types.iter().map(|t| t.code()).collect();
        println!(
            "{:>2}. {:<24} {:>4}  avg {:>3}%  sessions {:>3}  {}",
            rank + 1,
            entry.display_name,
            entry.rank_score,
            entry.average_percentage,
            entry.sessions_count,
            types.join(",")
        );
    }
}

pub async fn leaderboard(services: &AppServices, overview: bool) -> anyhow::Result<()> {
    if overview {
        let overview = services.leaderboard().class_overview().await?;
        show_board(&overview.entries);
        println!();
        println!("Class average: {}%", overview.class_average);
        if let Some(top) = overview.most_active {
            println!("Most active: {} ({} sessions)", top.display_name, top.sessions_count);
        }
    } else {
        show_board(&services.leaderboard().leaderboard().await?);
    }
    Ok(())
}

pub async fn stats(services: &AppServices, student: StudentId) -> anyhow::Result<()> {
    let stats = services.leaderboard().student_stats(student).await?;
    println!("Sessions: {}", stats.sessions_count);
    println!("Average:  {}%", stats.average_percentage);
    println!("Best:     {}%", stats.best_percentage);
    if let Some(last) = stats.last_active {
        println!("Last active: {}", last.format("%Y-%m-%d %H:%M"));
    }
    let standing = match stats.standing() {
        Some(Standing::Strong) => "strong",
        Some(Standing::Fair) => "fair",
        Some(Standing::NeedsAttention) => "needs attention",
        None => "no activity yet",
    };
    println!("Standing: {standing}");
    Ok(())
}
