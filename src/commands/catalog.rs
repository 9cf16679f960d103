//! Every console command as data: name, typed parameters and the
//! invocation steps it plans. The workflow does the rest.

use super::schema::{read_item_file, BoundArgs, ParamKind, ParamSpec};
use super::scope::CommandScope;
use crate::amount::TokenAmount;
use crate::asset::AssetDescriptor;
use crate::error::{ConsoleError, Result};
use crate::native::{
    contract_management, policy, role_management, token, CONTRACT_MANAGEMENT, POLICY_CONTRACT,
    ROLE_MANAGEMENT,
};
use crate::script::{ContractParameter, InvocationStep};
use crate::workflow::FaultPolicy;
use std::fmt;
use std::path::Path;

pub const SENDER: &str = "sender";
pub const SIGNERS: &str = "signers";

/// Appended to every state-changing command.
const SIGNING_PARAMS: [ParamSpec; 2] = [
    ParamSpec::optional(SENDER, ParamKind::Account),
    ParamSpec::optional(SIGNERS, ParamKind::Accounts),
];

pub type PlanFn = fn(&BoundArgs, &mut CommandScope<'_>) -> Result<Vec<InvocationStep>>;

/// How a read-only command presents the top of the result stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Render {
    Integer(&'static str),
    Accounts(&'static str),
    PublicKeys(&'static str),
    Stack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    StateChanging {
        fault_policy: FaultPolicy,
        needs_wallet: bool,
    },
    ReadOnly(Render),
}

const STATE_CHANGING: CommandKind = CommandKind::StateChanging {
    fault_policy: FaultPolicy::Continue,
    needs_wallet: false,
};

const POLICY_CHANGE: CommandKind = CommandKind::StateChanging {
    fault_policy: FaultPolicy::Continue,
    needs_wallet: true,
};

const CONTRACT_CHANGE: CommandKind = CommandKind::StateChanging {
    fault_policy: FaultPolicy::Refuse,
    needs_wallet: false,
};

pub struct CommandSpec {
    pub name: &'static str,
    pub category: &'static str,
    pub help: &'static str,
    pub params: &'static [ParamSpec],
    pub kind: CommandKind,
    pub plan: PlanFn,
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("params", &self.params)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl CommandSpec {
    pub fn is_state_changing(&self) -> bool {
        matches!(self.kind, CommandKind::StateChanging { .. })
    }

    /// Declared parameters plus the trailing sender/signers of state-changing commands.
    pub fn all_params(&self) -> Vec<ParamSpec> {
        let mut params = self.params.to_vec();
        if self.is_state_changing() {
            params.extend_from_slice(&SIGNING_PARAMS);
        }
        params
    }

    pub fn usage(&self) -> String {
        let mut usage = self.name.to_string();
        for param in self.all_params() {
            if param.optional {
                usage.push_str(&format!(" [{}]", param.name));
            } else {
                usage.push_str(&format!(" <{}>", param.name));
            }
        }
        usage
    }

    fn words(&self) -> impl Iterator<Item = &'static str> {
        self.name.split_whitespace()
    }
}

/// Finds the command whose name is the longest prefix of `tokens`.
/// Returns it with the number of tokens its name consumed.
pub fn find(tokens: &[String]) -> Option<(&'static CommandSpec, usize)> {
    CATALOG
        .iter()
        .filter_map(|spec| {
            let words: Vec<&str> = spec.words().collect();
            let matches = words.len() <= tokens.len()
                && words
                    .iter()
                    .zip(tokens)
                    .all(|(w, t)| w.eq_ignore_ascii_case(t));
            matches.then_some((spec, words.len()))
        })
        .max_by_key(|(_, consumed)| *consumed)
}

pub fn catalog() -> &'static [CommandSpec] {
    CATALOG
}

static CATALOG: &[CommandSpec] = &[
    CommandSpec {
        name: "invoke",
        category: "Contract Commands",
        help: "Invokes a contract method with JSON parameters",
        params: &[
            ParamSpec::required("contract", ParamKind::Account),
            ParamSpec::required("operation", ParamKind::Text),
            ParamSpec::optional("parameters", ParamKind::Parameters),
        ],
        kind: STATE_CHANGING,
        plan: plan_invoke,
    },
    CommandSpec {
        name: "transfer",
        category: "Contract Commands",
        help: "Transfers tokens, amount in whole tokens",
        params: &[
            ParamSpec::required("token", ParamKind::Account),
            ParamSpec::required("to", ParamKind::Account),
            ParamSpec::required("amount", ParamKind::Amount),
            ParamSpec::optional("data", ParamKind::Text),
        ],
        kind: STATE_CHANGING,
        plan: plan_transfer,
    },
    CommandSpec {
        name: "mint",
        category: "Contract Commands",
        help: "Pays <amount> base units of <asset> to <to>, then calls mint on <contract>",
        params: &[
            ParamSpec::required("contract", ParamKind::Account),
            ParamSpec::required("asset", ParamKind::Account),
            ParamSpec::required("to", ParamKind::Account),
            ParamSpec::required("amount", ParamKind::Amount),
        ],
        kind: STATE_CHANGING,
        plan: plan_mint,
    },
    CommandSpec {
        name: "deploy",
        category: "Contract Commands",
        help: "Deploys a contract from a .nef file and its manifest",
        params: &[
            ParamSpec::required("nef", ParamKind::File),
            ParamSpec::optional("manifest", ParamKind::File),
        ],
        kind: CONTRACT_CHANGE,
        plan: plan_deploy,
    },
    CommandSpec {
        name: "update",
        category: "Contract Commands",
        help: "Replaces a deployed contract's code and manifest",
        params: &[
            ParamSpec::required("contract", ParamKind::Account),
            ParamSpec::required("nef", ParamKind::File),
            ParamSpec::optional("manifest", ParamKind::File),
        ],
        kind: CONTRACT_CHANGE,
        plan: plan_update,
    },
    CommandSpec {
        name: "set max block",
        category: "Policy Commands",
        help: "Sets the maximum block size in bytes",
        params: &[ParamSpec::required("value", ParamKind::U32)],
        kind: POLICY_CHANGE,
        plan: plan_set_max_block,
    },
    CommandSpec {
        name: "set max transactions",
        category: "Policy Commands",
        help: "Sets the maximum number of transactions per block",
        params: &[ParamSpec::required("value", ParamKind::U32)],
        kind: POLICY_CHANGE,
        plan: plan_set_max_transactions,
    },
    CommandSpec {
        name: "set byte fee",
        category: "Policy Commands",
        help: "Sets the network fee per transaction byte",
        params: &[ParamSpec::required("value", ParamKind::I64)],
        kind: POLICY_CHANGE,
        plan: plan_set_byte_fee,
    },
    CommandSpec {
        name: "block account",
        category: "Policy Commands",
        help: "Blocks an account from sending transactions",
        params: &[ParamSpec::required("account", ParamKind::Account)],
        kind: POLICY_CHANGE,
        plan: plan_block_account,
    },
    CommandSpec {
        name: "unblock account",
        category: "Policy Commands",
        help: "Lifts a block on an account",
        params: &[ParamSpec::required("account", ParamKind::Account)],
        kind: POLICY_CHANGE,
        plan: plan_unblock_account,
    },
    CommandSpec {
        name: "designate role",
        category: "Native Contract Commands",
        help: "Designates nodes for a role by public key",
        params: &[
            ParamSpec::required("role", ParamKind::Role),
            ParamSpec::required("pubkeys", ParamKind::PublicKeys),
        ],
        kind: POLICY_CHANGE,
        plan: plan_designate,
    },
    CommandSpec {
        name: "get byte fee",
        category: "Policy Commands",
        help: "Shows the network fee per transaction byte",
        params: &[],
        kind: CommandKind::ReadOnly(Render::Integer("Fee per byte")),
        plan: plan_get_byte_fee,
    },
    CommandSpec {
        name: "get max block",
        category: "Policy Commands",
        help: "Shows the maximum block size",
        params: &[],
        kind: CommandKind::ReadOnly(Render::Integer("Max block size")),
        plan: plan_get_max_block,
    },
    CommandSpec {
        name: "get max transactions",
        category: "Policy Commands",
        help: "Shows the maximum number of transactions per block",
        params: &[],
        kind: CommandKind::ReadOnly(Render::Integer("Max block transactions")),
        plan: plan_get_max_transactions,
    },
    CommandSpec {
        name: "get blocked accounts",
        category: "Policy Commands",
        help: "Lists blocked accounts",
        params: &[],
        kind: CommandKind::ReadOnly(Render::Accounts("Blocked accounts")),
        plan: plan_get_blocked_accounts,
    },
    CommandSpec {
        name: "get designated",
        category: "Native Contract Commands",
        help: "Lists the public keys designated for a role, at the next block by default",
        params: &[
            ParamSpec::required("role", ParamKind::Role),
            ParamSpec::optional("index", ParamKind::U32),
        ],
        kind: CommandKind::ReadOnly(Render::PublicKeys("Designated nodes")),
        plan: plan_get_designated,
    },
];

fn plan_invoke(args: &BoundArgs, _scope: &mut CommandScope<'_>) -> Result<Vec<InvocationStep>> {
    Ok(vec![InvocationStep::new(
        args.account("contract")?,
        args.literal("operation")?,
        args.parameters("parameters"),
    )])
}

fn plan_transfer(args: &BoundArgs, scope: &mut CommandScope<'_>) -> Result<Vec<InvocationStep>> {
    let token_id = args.account("token")?;
    let to = args.account("to")?;

    let engine = scope.engine();
    let descriptor = AssetDescriptor::query(engine, scope.snapshot()?, token_id)?;
    let amount = descriptor.parse_amount(args.literal("amount")?)?;

    let data = args
        .opt_literal("data")
        .map(ContractParameter::from)
        .unwrap_or(ContractParameter::Any);

    Ok(vec![InvocationStep::new(
        token_id,
        token::TRANSFER,
        vec![scope.sender().into(), to.into(), amount.value.into(), data],
    )])
}

// Amounts are raw base units.
fn plan_mint(args: &BoundArgs, scope: &mut CommandScope<'_>) -> Result<Vec<InvocationStep>> {
    let amount = TokenAmount::parse_positive(args.literal("amount")?, 0)?;
    let contract = args.account("contract")?;
    let asset = args.account("asset")?;
    let to = args.account("to")?;

    Ok(vec![
        InvocationStep::new(
            asset,
            token::TRANSFER,
            vec![scope.sender().into(), to.into(), amount.value.into()],
        ),
        InvocationStep::without_args(contract, token::MINT),
    ])
}

/// The manifest argument, or `<nef stem>.manifest.json` next to the nef file.
fn contract_files(args: &BoundArgs) -> Result<(Vec<u8>, String)> {
    let (nef_path, nef) = args.file("nef")?;
    let manifest = match args.opt_file("manifest") {
        Some((_, bytes)) => bytes.to_vec(),
        None => read_item_file(&default_manifest_path(nef_path))?,
    };
    let manifest = String::from_utf8(manifest)
        .map_err(|_| ConsoleError::InvalidInput("Manifest is not UTF-8 text".to_string()))?;
    serde_json::from_str::<serde_json::Value>(&manifest)
        .map_err(|e| ConsoleError::InvalidInput(format!("Manifest is not valid JSON: {}", e)))?;
    Ok((nef.to_vec(), manifest))
}

fn default_manifest_path(nef_path: &Path) -> std::path::PathBuf {
    nef_path.with_extension("manifest.json")
}

fn plan_deploy(args: &BoundArgs, _scope: &mut CommandScope<'_>) -> Result<Vec<InvocationStep>> {
    let (nef, manifest) = contract_files(args)?;
    Ok(vec![InvocationStep::new(
        CONTRACT_MANAGEMENT,
        contract_management::DEPLOY,
        vec![ContractParameter::ByteArray(nef), ContractParameter::String(manifest)],
    )])
}

fn plan_update(args: &BoundArgs, _scope: &mut CommandScope<'_>) -> Result<Vec<InvocationStep>> {
    let contract = args.account("contract")?;
    let (nef, manifest) = contract_files(args)?;
    Ok(vec![InvocationStep::new(
        contract,
        contract_management::UPDATE,
        vec![
            ContractParameter::ByteArray(nef),
            ContractParameter::String(manifest),
            ContractParameter::Any,
        ],
    )])
}

fn policy_call(method: &str, args: Vec<ContractParameter>) -> Result<Vec<InvocationStep>> {
    Ok(vec![InvocationStep::new(POLICY_CONTRACT, method, args)])
}

fn plan_set_max_block(args: &BoundArgs, _: &mut CommandScope<'_>) -> Result<Vec<InvocationStep>> {
    policy_call(policy::SET_MAX_BLOCK_SIZE, vec![args.integer("value")?.into()])
}

fn plan_set_max_transactions(
    args: &BoundArgs,
    _: &mut CommandScope<'_>,
) -> Result<Vec<InvocationStep>> {
    policy_call(policy::SET_MAX_TRANSACTIONS_PER_BLOCK, vec![args.integer("value")?.into()])
}

fn plan_set_byte_fee(args: &BoundArgs, _: &mut CommandScope<'_>) -> Result<Vec<InvocationStep>> {
    policy_call(policy::SET_FEE_PER_BYTE, vec![args.integer("value")?.into()])
}

fn plan_block_account(args: &BoundArgs, _: &mut CommandScope<'_>) -> Result<Vec<InvocationStep>> {
    policy_call(policy::BLOCK_ACCOUNT, vec![args.account("account")?.into()])
}

fn plan_unblock_account(
    args: &BoundArgs,
    _: &mut CommandScope<'_>,
) -> Result<Vec<InvocationStep>> {
    policy_call(policy::UNBLOCK_ACCOUNT, vec![args.account("account")?.into()])
}

fn plan_designate(args: &BoundArgs, _: &mut CommandScope<'_>) -> Result<Vec<InvocationStep>> {
    let role = args.role("role")?;
    let keys = args
        .public_keys("pubkeys")?
        .into_iter()
        .map(|key| ContractParameter::PublicKey(key.to_vec()))
        .collect();
    Ok(vec![InvocationStep::new(
        ROLE_MANAGEMENT,
        role_management::DESIGNATE_AS_ROLE,
        vec![ContractParameter::Integer(role as i128), ContractParameter::Array(keys)],
    )])
}

fn plan_get_byte_fee(_: &BoundArgs, _: &mut CommandScope<'_>) -> Result<Vec<InvocationStep>> {
    policy_call(policy::GET_FEE_PER_BYTE, vec![])
}

fn plan_get_max_block(_: &BoundArgs, _: &mut CommandScope<'_>) -> Result<Vec<InvocationStep>> {
    policy_call(policy::GET_MAX_BLOCK_SIZE, vec![])
}

fn plan_get_max_transactions(
    _: &BoundArgs,
    _: &mut CommandScope<'_>,
) -> Result<Vec<InvocationStep>> {
    policy_call(policy::GET_MAX_TRANSACTIONS_PER_BLOCK, vec![])
}

fn plan_get_blocked_accounts(
    _: &BoundArgs,
    _: &mut CommandScope<'_>,
) -> Result<Vec<InvocationStep>> {
    policy_call(policy::GET_BLOCKED_ACCOUNTS, vec![])
}

fn plan_get_designated(args: &BoundArgs, scope: &mut CommandScope<'_>) -> Result<Vec<InvocationStep>> {
    let role = args.role("role")?;
    let index = match args.opt_integer("index") {
        Some(index) => index,
        None => scope.snapshot()?.height as i128 + 1,
    };
    Ok(vec![InvocationStep::new(
        ROLE_MANAGEMENT,
        role_management::GET_DESIGNATED_BY_ROLE,
        vec![ContractParameter::Integer(role as i128), ContractParameter::Integer(index)],
    )])
}
