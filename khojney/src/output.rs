//! Terminal, markdown and JSON rendering of command results.

use anyhow::Result;
use khojney_core::admin::UserOverview;
use khojney_core::analytics::{
    format_change, AnalyticsReport, HistoryPage, LeaderboardView, PersonalDashboard,
};
use khojney_core::quiz::AttemptResult;
use khojney_core::types::QuestionStat;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn header(title: &str) {
    println!();
    println!("╭{}╮", "─".repeat(60));
    println!("│{:^60}│", title);
    println!("╰{}╯", "─".repeat(60));
    println!();
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

fn display_name(name: Option<&str>, id: &str) -> String {
    name.map(str::to_string).unwrap_or_else(|| id.to_string())
}

// ============================================
// Analytics report
// ============================================

pub fn print_report_terminal(report: &AnalyticsReport) {
    header(&format!(
        "Analytics: {} to {}",
        report.range.from, report.range.to
    ));

    if let Some(user_id) = &report.user_id {
        println!("  User: {}", user_id);
        println!();
    }

    println!("SUMMARY (vs {} to {})", report.previous_range.from, report.previous_range.to);
    println!(
        "   Quizzes:   {:<12} {}",
        report.kpis.total_quizzes,
        format_change(report.changes.total_quizzes)
    );
    println!(
        "   Avg score: {:<12} {}",
        report.kpis.avg_score,
        format_change(report.changes.avg_score)
    );
    println!(
        "   New users: {:<12} {}",
        report.kpis.total_users,
        format_change(report.changes.total_users)
    );
    println!("   Top category: {}", report.kpis.top_category);
    println!();

    if report.kpis.total_quizzes == 0 {
        println!("  No completed quizzes in this period.");
        println!();
    }

    if !report.category_chart.is_empty() {
        println!("CATEGORIES");
        for point in &report.category_chart {
            println!(
                "   {:<24} {:>5} quizzes   avg {:.1}",
                truncate(&point.name, 24),
                point.quizzes,
                point.avg_score
            );
        }
        println!();
    }

    if !report.activity_chart.is_empty() {
        println!("DAILY ACTIVITY");
        for point in &report.activity_chart {
            println!("   {}  {}", point.date, "▇".repeat(point.quizzes.min(40) as usize));
        }
        println!();
    }

    if !report.signup_chart.is_empty() {
        println!("SIGNUPS");
        for point in &report.signup_chart {
            println!("   {}  {}", point.date, point.new_users);
        }
        println!();
    }

    print_question_list("HARDEST QUESTIONS", &report.question_stats.hardest);
    print_question_list("EASIEST QUESTIONS", &report.question_stats.easiest);

    if !report.leaderboard.is_empty() {
        println!("LEADERBOARD");
        for entry in &report.leaderboard {
            println!(
                "   #{:<3} {:<24} {:>6}",
                entry.rank,
                truncate(&display_name(entry.full_name.as_deref(), &entry.user_id), 24),
                entry.total_score
            );
        }
        println!();
    }
}

fn print_question_list(title: &str, stats: &[QuestionStat]) {
    if stats.is_empty() {
        return;
    }
    println!("{}", title);
    for stat in stats {
        println!(
            "   {:>5.1}%  {} ({} answers)",
            stat.correct_percentage,
            truncate(&stat.question_text, 40),
            stat.total_attempts
        );
    }
    println!();
}

pub fn print_report_markdown(report: &AnalyticsReport) {
    println!(
        "# Analytics: {} to {}",
        report.range.from, report.range.to
    );
    println!();
    if let Some(user_id) = &report.user_id {
        println!("*User: {}*", user_id);
        println!();
    }

    println!("## Summary");
    println!();
    println!("| Metric | Value | Change |");
    println!("|--------|-------|--------|");
    println!(
        "| Quizzes | {} | {} |",
        report.kpis.total_quizzes,
        format_change(report.changes.total_quizzes)
    );
    println!(
        "| Avg score | {} | {} |",
        report.kpis.avg_score,
        format_change(report.changes.avg_score)
    );
    println!(
        "| New users | {} | {} |",
        report.kpis.total_users,
        format_change(report.changes.total_users)
    );
    println!("| Top category | {} | |", report.kpis.top_category);
    println!();

    if !report.category_chart.is_empty() {
        println!("## Categories");
        println!();
        println!("| Category | Quizzes | Avg score |");
        println!("|----------|---------|-----------|");
        for point in &report.category_chart {
            println!("| {} | {} | {:.1} |", point.name, point.quizzes, point.avg_score);
        }
        println!();
    }

    if !report.activity_chart.is_empty() {
        println!("## Daily Activity");
        println!();
        println!("| Date | Quizzes |");
        println!("|------|---------|");
        for point in &report.activity_chart {
            println!("| {} | {} |", point.date, point.quizzes);
        }
        println!();
    }

    if !report.signup_chart.is_empty() {
        println!("## Signups");
        println!();
        println!("| Date | New users |");
        println!("|------|-----------|");
        for point in &report.signup_chart {
            println!("| {} | {} |", point.date, point.new_users);
        }
        println!();
    }

    for (title, stats) in [
        ("Hardest Questions", &report.question_stats.hardest),
        ("Easiest Questions", &report.question_stats.easiest),
    ] {
        if stats.is_empty() {
            continue;
        }
        println!("## {}", title);
        println!();
        println!("| Question | Correct | Answers |");
        println!("|----------|---------|---------|");
        for stat in stats {
            println!(
                "| {} | {:.1}% | {} |",
                stat.question_text.replace('|', "\\|"),
                stat.correct_percentage,
                stat.total_attempts
            );
        }
        println!();
    }

    println!("---");
    println!("*Generated by khojney*");
}

// ============================================
// Dashboard
// ============================================

pub fn print_dashboard_terminal(dashboard: &PersonalDashboard, history: &HistoryPage) {
    let title = match &dashboard.profile {
        Some(p) => format!("Dashboard: {}", display_name(p.full_name.as_deref(), &p.id)),
        None => "Dashboard".to_string(),
    };
    header(&title);

    let streak = dashboard
        .profile
        .as_ref()
        .map_or(0, |p| p.current_streak);
    println!(
        "   Quizzes: {:<10} Questions: {:<10} Accuracy: {}%   Streak: {}",
        dashboard.stats.total_quizzes,
        dashboard.stats.total_questions,
        dashboard.stats.accuracy,
        streak
    );
    println!();

    if !dashboard.performance.is_empty() {
        println!("CATEGORY PERFORMANCE");
        for row in &dashboard.performance {
            println!(
                "   {:<24} {:>4}/{:<4} {:>5.1}%",
                truncate(&row.category_name, 24),
                row.correct_answers,
                row.total_questions_answered,
                row.percentage
            );
        }
        println!();
    }

    println!("QUIZ HISTORY");
    if history.attempts.is_empty() {
        println!("   No attempts match filters.");
    }
    for attempt in &history.attempts {
        let when = attempt
            .completed_at
            .unwrap_or(attempt.created_at)
            .format("%Y-%m-%d %H:%M");
        println!(
            "   {}  {:<24} {:<10} {}",
            when,
            truncate(attempt.category_name.as_deref().unwrap_or("General"), 24),
            attempt.status.as_str(),
            attempt.score.map_or("-".to_string(), |s| s.to_string())
        );
    }
    if history.total_pages > 1 {
        println!("   Page {} of {}", history.page, history.total_pages);
    }
    println!(
        "   Categories: {}",
        dashboard.available_categories().join(", ")
    );
    println!();
}

// ============================================
// Quiz result
// ============================================

pub fn print_result_terminal(result: &AttemptResult) {
    header(&format!("Result: {}", result.category_name));

    println!(
        "   Score: {}/{}   Accuracy: {}%   Time: {}",
        result.correct_answers,
        result.total_questions,
        result.accuracy,
        result
            .attempt
            .time_taken_seconds
            .map_or("-".to_string(), |s| format!("{}s", s))
    );
    if let Some(per_question) = result.time_per_question {
        println!("   {:.1}s per question", per_question);
    }
    println!();

    for (i, review) in result.answers.iter().enumerate() {
        let mark = match review.is_correct {
            Some(true) => "✓",
            Some(false) => "✗",
            None => "-",
        };
        println!("{} {}. {}", mark, i + 1, review.question.question_text_en);
        for option in &review.question.options {
            let chosen = review.selected_option_id.as_deref() == Some(option.id.as_str());
            let tag = match (chosen, option.is_correct) {
                (true, true) => " (your answer, correct)",
                (true, false) => " (your answer)",
                (false, true) => " (correct)",
                (false, false) => "",
            };
            println!("     - {}{}", option.option_text_en, tag);
        }
        if let Some(explanation) = &review.question.explanation_en {
            println!("     {}", explanation);
        }
        println!();
    }
}

// ============================================
// Leaderboard and users
// ============================================

pub fn print_leaderboard_terminal(view: &LeaderboardView) {
    header(&format!("Leaderboard: {}", view.period.as_str()));

    if view.entries.is_empty() {
        println!("  No rankings yet.");
        println!();
    }
    for entry in &view.entries {
        println!(
            "   #{:<4} {:<28} {:>7} pts  {:>4} quizzes",
            entry.rank,
            truncate(&display_name(entry.full_name.as_deref(), &entry.user_id), 28),
            entry.total_score,
            entry.quizzes_completed
        );
    }

    if let Some(mine) = &view.user_rank {
        println!();
        println!("   Your rank: #{} with {} pts", mine.rank, mine.total_score);
    }
    println!();
}

pub fn print_users_terminal(overview: &UserOverview) {
    header("Users");

    let b = &overview.breakdown;
    println!(
        "   Total: {:<6} Admins: {:<6} Regular: {:<6} Premium: {}",
        b.total, b.admins, b.regular_users, b.premium_users
    );
    println!();

    for user in &overview.users {
        println!(
            "   {:<38} {:<24} {:<13} {}",
            user.id,
            truncate(user.full_name.as_deref().unwrap_or("-"), 24),
            user.role.as_str(),
            user.created_at.format("%Y-%m-%d")
        );
    }
    println!();
}
