//! Pre-flight validation. Runs before any address is derived or instruction
//! built; a rejected configuration never reaches the ledger.

use std::fmt;
use std::str::FromStr;

use potlaunch_sdk::accounts::{CurveShape, Recipient, VestingSchedule};
use potlaunch_sdk::constants::{
    BPS_DENOMINATOR, DEFAULT_ALLOCATION_NAME, MAX_ALLOCATION_NAME_LEN, MAX_ALLOCATION_PERCENT,
};
use potlaunch_sdk::instructions::CreateFairLaunchArgs;
use potlaunch_sdk::mint::{to_base_units, MAX_NAME_LEN, MAX_SYMBOL_LEN, MAX_URI_LEN};
use potlaunch_sdk::pricing::initial_reserve_requirement;
use solana_sdk::pubkey::Pubkey;

use crate::launch::{CurveKind, Revocation, TokenLaunchConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    BasicInfo,
    Socials,
    Fees,
    Allocation,
    Curve,
    SaleSetup,
    AdminSetup,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BasicInfo => "basic info",
            Self::Socials => "socials",
            Self::Fees => "fees",
            Self::Allocation => "allocation",
            Self::Curve => "curve",
            Self::SaleSetup => "sale setup",
            Self::AdminSetup => "admin setup",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub section: Section,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    Mint,
    Freeze,
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mint => "mint",
            Self::Freeze => "freeze",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("incomplete sections: {}", describe(.problems))]
    Incomplete { problems: Vec<Problem> },

    #[error("{authority} authority revocation is enabled but no destination wallet was given")]
    MissingRevocationTarget { authority: Authority },
}

fn describe(problems: &[Problem]) -> String {
    problems
        .iter()
        .map(|p| format!("{}: {}", p.section, p.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Distinct failing sections, in first-seen order.
    pub fn sections(&self) -> Vec<Section> {
        let mut out = Vec::new();
        if let Self::Incomplete { problems } = self {
            for p in problems {
                if !out.contains(&p.section) {
                    out.push(p.section);
                }
            }
        }
        out
    }
}

/// Trimmed description cut to [`MAX_ALLOCATION_NAME_LEN`] bytes on a char
/// boundary; blank or missing descriptions get [`DEFAULT_ALLOCATION_NAME`].
pub fn allocation_name(description: Option<&str>) -> String {
    let text = description.map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return DEFAULT_ALLOCATION_NAME.to_string();
    }
    let mut end = text.len().min(MAX_ALLOCATION_NAME_LEN);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].trim_end().to_string()
}

// ── Validated Launch ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedAllocation {
    pub wallet: Pubkey,
    /// On-chain record name, from the entry's description.
    pub name: String,
    pub percentage: u8,
    /// Base units: `raw_supply * percentage / 100`.
    pub total_tokens: u64,
    pub vesting: Option<VestingSchedule>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedCurve {
    pub shape: CurveShape,
    pub initial_price: u64,
    pub reserve_ratio: u16,
    pub target_liquidity: u64,
    pub initial_quorum: u64,
    pub dao_quorum: u16,
    pub governance: Option<Pubkey>,
    pub liquidity_lock_period: i64,
    pub liquidity_pool_percentage: u16,
    /// Lamports the pool needs at creation.
    pub initial_reserve: u128,
}

/// A configuration that passed every check, with addresses parsed and
/// relative times made absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLaunch {
    pub name: String,
    pub symbol: String,
    pub uri: String,
    pub decimals: u8,
    /// Whole tokens.
    pub supply: u64,
    /// Base units.
    pub raw_supply: u64,
    pub fee_percentage: u16,
    pub fee_recipients: Vec<Recipient>,
    pub allocations: Vec<ValidatedAllocation>,
    pub curve: ValidatedCurve,
    pub sale: Option<CreateFairLaunchArgs>,
    pub mint_authority_target: Option<Pubkey>,
    pub freeze_authority_target: Option<Pubkey>,
}

// ── Validation ──────────────────────────────────────────────────────────────

struct Collector(Vec<Problem>);

impl Collector {
    fn push(&mut self, section: Section, message: impl Into<String>) {
        self.0.push(Problem {
            section,
            message: message.into(),
        });
    }

    fn pubkey(&mut self, section: Section, label: &str, value: &str) -> Option<Pubkey> {
        match Pubkey::from_str(value.trim()) {
            Ok(key) => Some(key),
            Err(_) => {
                self.push(section, format!("{label} {value:?} is not a valid address"));
                None
            }
        }
    }
}

fn revocation_target(
    revocation: &Revocation,
    authority: Authority,
    problems: &mut Collector,
) -> Result<Option<Pubkey>, ValidationError> {
    if !revocation.enabled {
        return Ok(None);
    }
    match revocation.destination.as_deref().map(str::trim) {
        None | Some("") => Err(ValidationError::MissingRevocationTarget { authority }),
        Some(dest) => Ok(problems.pubkey(
            Section::AdminSetup,
            &format!("{authority} authority destination"),
            dest,
        )),
    }
}

/// Check every section and produce the launch the planner consumes.
///
/// `now` is the unix time used to anchor vesting and sale windows.
pub fn validate(config: &TokenLaunchConfig, now: i64) -> Result<ValidatedLaunch, ValidationError> {
    let mut problems = Collector(Vec::new());

    // Revocation without a destination is reported on its own.
    let mint_authority_target = revocation_target(
        &config.admin_setup.revoke_mint_authority,
        Authority::Mint,
        &mut problems,
    )?;
    let freeze_authority_target = revocation_target(
        &config.admin_setup.revoke_freeze_authority,
        Authority::Freeze,
        &mut problems,
    )?;

    // Basic info
    let basic = &config.basic_info;
    if basic.name.trim().is_empty() {
        problems.push(Section::BasicInfo, "name is required");
    } else if basic.name.len() > MAX_NAME_LEN {
        problems.push(Section::BasicInfo, format!("name exceeds {MAX_NAME_LEN} bytes"));
    }
    if basic.symbol.trim().is_empty() {
        problems.push(Section::BasicInfo, "symbol is required");
    } else if basic.symbol.len() > MAX_SYMBOL_LEN {
        problems.push(Section::BasicInfo, format!("symbol exceeds {MAX_SYMBOL_LEN} bytes"));
    }
    if basic.metadata_uri.len() > MAX_URI_LEN {
        problems.push(Section::BasicInfo, format!("metadata URI exceeds {MAX_URI_LEN} bytes"));
    }
    let raw_supply = if basic.supply == 0 {
        problems.push(Section::BasicInfo, "supply must be greater than zero");
        None
    } else {
        match to_base_units(basic.supply, basic.decimals) {
            Ok(raw) => Some(raw),
            Err(_) => {
                problems.push(
                    Section::BasicInfo,
                    format!(
                        "supply {} with {} decimals exceeds u64 base units",
                        basic.supply, basic.decimals
                    ),
                );
                None
            }
        }
    };

    // Socials
    if !config.socials.has_channel() {
        problems.push(Section::Socials, "at least one social channel is required");
    }

    // Fees
    let fees = &config.fees;
    if fees.fee_percentage as u64 > BPS_DENOMINATOR {
        problems.push(Section::Fees, "fee percentage exceeds 10000 basis points");
    }
    if fees.recipients.is_empty() {
        problems.push(Section::Fees, "at least one fee recipient is required");
    }
    let share_total: u64 = fees.recipients.iter().map(|r| r.share_bps as u64).sum();
    if share_total > BPS_DENOMINATOR {
        problems.push(
            Section::Fees,
            format!("fee recipient shares total {share_total} basis points, above 10000"),
        );
    }
    let fee_recipients: Vec<Recipient> = fees
        .recipients
        .iter()
        .filter_map(|r| {
            problems
                .pubkey(Section::Fees, "fee recipient", &r.address)
                .map(|address| Recipient {
                    address,
                    share: r.share_bps,
                    amount: 0,
                    locking_period: r.lock_period,
                })
        })
        .collect();

    // Allocation
    if config.allocation.is_empty() {
        problems.push(Section::Allocation, "at least one allocation is required");
    }
    let percent_total: u32 = config.allocation.iter().map(|a| a.percentage as u32).sum();
    if percent_total > MAX_ALLOCATION_PERCENT as u32 {
        problems.push(
            Section::Allocation,
            format!("allocations total {percent_total}%, above 100%"),
        );
    }
    let mut allocations = Vec::with_capacity(config.allocation.len());
    for entry in &config.allocation {
        let wallet = problems.pubkey(Section::Allocation, "allocation wallet", &entry.wallet_address);
        let vesting = match entry.vesting {
            Some(v) if v.cliff < 0 || v.duration < 0 || v.interval < 0 || v.start_delay < 0 => {
                problems.push(Section::Allocation, "vesting periods must not be negative");
                None
            }
            Some(v) if v.cliff > v.duration => {
                problems.push(
                    Section::Allocation,
                    format!("vesting cliff {} exceeds duration {}", v.cliff, v.duration),
                );
                None
            }
            Some(v) => Some(VestingSchedule {
                cliff_period: v.cliff,
                start_time: now.saturating_add(v.start_delay),
                duration: v.duration,
                interval: v.interval,
                released: 0,
            }),
            None => None,
        };
        if let (Some(wallet), Some(raw)) = (wallet, raw_supply) {
            // percentage <= 100 once the total check passed, so this fits in u64
            let total_tokens = (raw as u128 * entry.percentage as u128 / 100) as u64;
            allocations.push(ValidatedAllocation {
                wallet,
                name: allocation_name(entry.description.as_deref()),
                percentage: entry.percentage,
                total_tokens,
                vesting,
            });
        }
    }

    // Curve
    let curve = &config.curve;
    if curve.liquidity_pool_percentage > 100 {
        problems.push(Section::Curve, "liquidity pool percentage exceeds 100");
    }
    if curve.dao_quorum as u64 > BPS_DENOMINATOR {
        problems.push(Section::Curve, "DAO quorum exceeds 10000 basis points");
    }
    if curve.liquidity_lock_period < 0 {
        problems.push(Section::Curve, "liquidity lock period must not be negative");
    }
    let governance = curve
        .governance
        .as_deref()
        .filter(|g| !g.trim().is_empty())
        .and_then(|g| problems.pubkey(Section::Curve, "governance", g));
    let initial_reserve = match raw_supply {
        Some(raw) => match initial_reserve_requirement(
            curve.initial_price,
            raw,
            curve.reserve_ratio,
            basic.decimals,
        ) {
            Ok(reserve) => Some(reserve),
            Err(e) => {
                problems.push(Section::Curve, e.to_string());
                None
            }
        },
        None => None,
    };

    // Sale
    let sale = config.sale_setup.as_ref().map(|s| {
        if s.hard_cap == 0 {
            problems.push(Section::SaleSetup, "hard cap must be greater than zero");
        }
        if s.soft_cap > s.hard_cap {
            problems.push(Section::SaleSetup, "soft cap exceeds hard cap");
        }
        if s.min_contribution > s.max_contribution {
            problems.push(Section::SaleSetup, "minimum contribution exceeds maximum");
        }
        if s.duration <= 0 {
            problems.push(Section::SaleSetup, "sale duration must be positive");
        }
        if s.start_delay < 0 || s.distribution_delay < 0 {
            problems.push(Section::SaleSetup, "sale delays must not be negative");
        }
        let start_time = now.saturating_add(s.start_delay);
        CreateFairLaunchArgs {
            soft_cap: s.soft_cap,
            hard_cap: s.hard_cap,
            start_time,
            end_time: start_time.saturating_add(s.duration),
            min_contribution: s.min_contribution,
            max_contribution: s.max_contribution,
            max_tokens_per_wallet: s.max_tokens_per_wallet,
            distribution_delay: s.distribution_delay,
        }
    });

    match (problems.0.is_empty(), raw_supply, initial_reserve) {
        (true, Some(raw_supply), Some(initial_reserve)) => Ok(ValidatedLaunch {
            name: basic.name.trim().to_string(),
            symbol: basic.symbol.trim().to_string(),
            uri: basic.metadata_uri.clone(),
            decimals: basic.decimals,
            supply: basic.supply,
            raw_supply,
            fee_percentage: fees.fee_percentage,
            fee_recipients,
            allocations,
            curve: ValidatedCurve {
                shape: match curve.curve_type {
                    CurveKind::Linear => CurveShape::Linear,
                    CurveKind::Quadratic => CurveShape::Quadratic,
                },
                initial_price: curve.initial_price,
                reserve_ratio: curve.reserve_ratio,
                target_liquidity: curve.target_liquidity,
                initial_quorum: curve.initial_quorum,
                dao_quorum: curve.dao_quorum,
                governance,
                liquidity_lock_period: curve.liquidity_lock_period,
                liquidity_pool_percentage: curve.liquidity_pool_percentage,
                initial_reserve,
            },
            sale,
            mint_authority_target,
            freeze_authority_target,
        }),
        _ => Err(ValidationError::Incomplete {
            problems: problems.0,
        }),
    }
}
