use skybook_core::code::{generate_code, group_member_code};
use skybook_core::{BookingError, BookingResult};
use skybook_store::CodeRepository;
use sqlx::{Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

const MAX_ATTEMPTS: usize = 32;

/// Reserves a fresh standardized code for `ticket_code` inside `tx`.
pub async fn allocate_unique_code(tx: &mut Transaction<'_, Postgres>, ticket_code: Uuid) -> BookingResult<String> {
    for _ in 0..MAX_ATTEMPTS {
        let candidate = generate_code();
        if CodeRepository::try_reserve(tx, &candidate, ticket_code).await? {
            return Ok(candidate);
        }
        debug!("Ticket code {} already taken, retrying", candidate);
    }
    Err(BookingError::Storage(format!(
        "no free ticket code after {} attempts",
        MAX_ATTEMPTS
    )))
}

/// Codes handed out to one group booking: the bare group code and one `<group>-<n>` code
/// per ticket, in ticket order.
#[derive(Debug, Clone)]
pub struct GroupCodes {
    pub group_code: String,
    pub member_codes: Vec<String>,
}

pub async fn allocate_group_codes(
    tx: &mut Transaction<'_, Postgres>,
    ticket_codes: &[Uuid],
) -> BookingResult<GroupCodes> {
    allocate_group_codes_with(tx, ticket_codes, generate_code).await
}

/// Claims a group code by reserving `<group>-1` for the first ticket, then maps every other
/// ticket to `<group>-<n>`. A candidate already used bare or as a prefix is skipped. When
/// another open transaction holds the same `<group>-1`, the reservation waits for it and
/// moves on to the next candidate if that transaction commits.
pub async fn allocate_group_codes_with<F>(
    tx: &mut Transaction<'_, Postgres>,
    ticket_codes: &[Uuid],
    mut next_candidate: F,
) -> BookingResult<GroupCodes>
where
    F: FnMut() -> String,
{
    let (first, rest) = ticket_codes
        .split_first()
        .ok_or_else(|| BookingError::Validation("a group needs at least one ticket".to_string()))?;

    for _ in 0..MAX_ATTEMPTS {
        let candidate = next_candidate();
        if CodeRepository::group_in_use(&mut **tx, &candidate).await? {
            debug!("Group code {} already taken, retrying", candidate);
            continue;
        }
        let lead = group_member_code(&candidate, 1);
        if !CodeRepository::try_reserve(tx, &lead, *first).await? {
            debug!("Group code {} claimed concurrently, retrying", candidate);
            continue;
        }

        let mut member_codes = Vec::with_capacity(ticket_codes.len());
        member_codes.push(lead);
        for (index, ticket_code) in rest.iter().enumerate() {
            let code = group_member_code(&candidate, index + 2);
            CodeRepository::insert(tx, &code, *ticket_code).await?;
            member_codes.push(code);
        }
        return Ok(GroupCodes {
            group_code: candidate,
            member_codes,
        });
    }
    Err(BookingError::Storage(format!(
        "no free group code after {} attempts",
        MAX_ATTEMPTS
    )))
}
