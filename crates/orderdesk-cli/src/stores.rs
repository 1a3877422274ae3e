use chrono::NaiveDate;

/// Print lead stores still flagged for review.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_list_leads(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let leads = orderdesk_db::list_flagged_leads(pool).await?;

    if leads.is_empty() {
        println!("no leads awaiting review");
        return Ok(());
    }

    println!("{:<8}{:<36}{:<32}LAST ORDER", "ID", "COMPANY", "EMAIL");
    for lead in &leads {
        println!(
            "{:<8}{:<36}{:<32}{}",
            lead.id,
            truncate(&lead.company_name, 34),
            lead.email.as_deref().unwrap_or("-"),
            fmt_date(lead.last_order_date)
        );
    }

    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        format!("{}...", text.chars().take(max_chars - 3).collect::<String>())
    } else {
        text.to_string()
    }
}

fn fmt_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string())
}
