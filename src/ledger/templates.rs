use crate::types::amount::Amount;

#[derive(Clone, Debug)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

/// Notification sent on the lender's behalf to the borrower: repayment
/// reminder or clearance confirmation, with a registration call-to-action
/// when the borrower has no account yet.
pub fn owner_to_counterpart(
    counterpart_name: &str,
    owner_name: &str,
    amount: Amount,
    description: &str,
    is_cleared: bool,
    is_registered: bool,
    registration_link: &str,
) -> RenderedEmail {
    let subject = if is_cleared {
        "Confirmation: Loan Successfully Cleared".to_string()
    } else {
        "Reminder: Loan Repayment Due".to_string()
    };

    let header = if is_cleared {
        format!("Great News, {counterpart_name}!")
    } else {
        format!("Reminder for Loan Repayment, {counterpart_name}")
    };

    let main_message = if is_cleared {
        format!(
            "I am pleased to inform you that your loan repayment of {amount} has been \
             successfully received and marked as fully cleared. Thank you for settling your dues!"
        )
    } else {
        format!(
            "This is a gentle reminder that you have an outstanding loan repayment of {amount} \
             that is yet to be cleared. Kindly ensure the payment at the earliest."
        )
    };

    let registration_block = if is_registered {
        String::new()
    } else {
        format!(
            r#"<div style="margin-top: 20px; padding: 15px; background-color: #fffbcc; border-left: 5px solid #ffcc00;">
  <p style="color: #555555; font-size: 16px;">
    We noticed that you are not yet registered on our platform. To manage your loans and repayments easily, please register using the link below:
  </p>
  <p style="text-align: center; margin-top: 10px;">
    <a href="{registration_link}" style="background-color: #007bff; color: #ffffff; padding: 10px 15px; border-radius: 5px; text-decoration: none; font-weight: bold;">
      Complete Registration
    </a>
  </p>
</div>"#
        )
    };

    RenderedEmail {
        subject,
        html: card(
            &header,
            &main_message,
            description,
            &registration_block,
            owner_name,
            "Please review your records and confirm accordingly.",
        ),
    }
}

/// Notification sent on the borrower's behalf to the lender. This family
/// has no registration block.
pub fn counterpart_to_owner(
    lender_name: &str,
    borrower_name: &str,
    amount: Amount,
    description: &str,
    is_cleared: bool,
) -> RenderedEmail {
    let subject = if is_cleared {
        "Confirmation: Loan Repayment Completed".to_string()
    } else {
        "Acknowledgment: Loan Repayment in Progress".to_string()
    };

    let header = if is_cleared {
        format!("Good News, {lender_name}!")
    } else {
        format!("Update on Loan Repayment, {lender_name}")
    };

    let main_message = if is_cleared {
        format!(
            "I am pleased to inform you that I have successfully repaid the loan amount of \
             {amount} in full. The payment has been completed, and the loan is now cleared."
        )
    } else {
        format!(
            "I acknowledge the pending loan repayment of {amount} and would like to assure you \
             that I am actively working towards settling the remaining amount soon."
        )
    };

    RenderedEmail {
        subject,
        html: card(
            &header,
            &main_message,
            description,
            "",
            borrower_name,
            "Please update your records accordingly.",
        ),
    }
}

fn card(
    header: &str,
    main_message: &str,
    description: &str,
    extra_block: &str,
    signer: &str,
    closing: &str,
) -> String {
    let description_block = if description.is_empty() {
        String::new()
    } else {
        format!(r#"<p style="font-size: 16px; color: #555555;"><strong>Details:</strong> {description}</p>"#)
    };

    format!(
        r#"<div style="background-color: #f9f9f9; padding: 20px;">
  <div style="max-width: 600px; background-color: #ffffff; border-radius: 8px; padding: 20px; margin: auto;">
    <h2 style="font-size: 24px; color: #333333; margin-bottom: 20px;">{header}</h2>
    <p style="font-size: 16px; color: #555555;">{main_message}</p>
    {description_block}
    {extra_block}
    <p style="margin-top: 20px; font-size: 16px; color: #666666;">{closing}</p>
    <hr style="margin: 20px 0; border: none; border-top: 1px solid #dddddd;" />
    <p style="font-size: 14px; color: #999999;">Best regards,</p>
    <p style="font-size: 16px; font-weight: bold; color: #333333;">{signer}</p>
  </div>
</div>"#
    )
}
