//! Pledge confirmation content, shared by the SES and mock services.

/// What the backer committed to, as shown in the confirmation email
#[derive(Debug, Clone)]
pub struct PledgeConfirmation<'a> {
    pub backer_name: &'a str,
    pub project_title: &'a str,
    pub project_slug: &'a str,
    /// Already formatted, e.g. `"25.00 CHF"`
    pub amount: &'a str,
    pub reward: Option<&'a str>,
}

pub fn pledge_subject(project_title: &str) -> String {
    format!("Thank you for supporting {}", project_title)
}

pub fn pledge_thank_you_text(confirmation: &PledgeConfirmation<'_>, project_url: &str) -> String {
    let reward_line = match confirmation.reward {
        Some(reward) => format!("Your reward: {}\n\n", reward),
        None => String::new(),
    };

    format!(
        "Hi {}!\n\n\
        Thank you for backing \"{}\" with {}.\n\n\
        {}\
        Follow the project here:\n\
        {}\n\n\
        Thanks,\n\
        The Crowdfund Team",
        confirmation.backer_name,
        confirmation.project_title,
        confirmation.amount,
        reward_line,
        project_url
    )
}

pub fn pledge_thank_you_html(confirmation: &PledgeConfirmation<'_>, project_url: &str) -> String {
    let reward_block = match confirmation.reward {
        Some(reward) => format!("<p>Your reward: <strong>{}</strong></p>", escape(reward)),
        None => String::new(),
    };

    format!(
        r#"
            <html>
            <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
                <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
                    <h2 style="color: #2e7d32;">Thank you for supporting {project_title}!</h2>

                    <p>Hi {backer_name}!</p>

                    <p>You backed <strong>{project_title}</strong> with <strong>{amount}</strong>.</p>

                    {reward_block}

                    <p><a href="{project_url}">Follow the project</a></p>

                    <hr style="border: none; border-top: 1px solid #eee; margin: 30px 0;">

                    <p style="color: #666; font-size: 12px;">Thanks, The Crowdfund Team</p>
                </div>
            </body>
            </html>
            "#,
        project_title = escape(confirmation.project_title),
        backer_name = escape(confirmation.backer_name),
        amount = escape(confirmation.amount),
        reward_block = reward_block,
        project_url = project_url
    )
}

/// Project titles and reward descriptions are staff-authored free text.
fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
