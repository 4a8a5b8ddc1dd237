use std::fmt;

use anyhow::Context;
use stonequarry_core::registry::MOD_NAMESPACE;
use stonequarry_core::{BlockPos, Facing, ItemStack, RegistryKey};
use stonequarry_world::{
    AllowedCodes, BlockAccess, BlockEntityMap, BlockEntityState, MaterialTier, PlugBlock,
    PlugMetal, PlugNetwork, PlugOrientation, PlugStrike, QuarryConfig, QuarryWorld, RubbleDrop,
    RubbleStorage, SandboxWorld, SlabContents, SlabCut, SlabDropType, SlabTool,
};

const RUBBLE_STORAGE_PATH: &str = "rubblestorage";
const SLAB_PATH_PREFIX: &str = "stoneslab-";
const DEFAULT_PLUG_STAGES: u8 = 3;
const DEFAULT_IMPACT: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
    message: String,
}

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CommandError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RubbleAction {
    Place,
    Add { item: RegistryKey, count: u32 },
    AddAll,
    Take { tier: MaterialTier, count: u32 },
    Hammer,
    Lock { tier: MaterialTier },
    Break,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlabAction {
    Place,
    Cut {
        drop_type: SlabDropType,
        quantity: u32,
        seconds: Option<f32>,
    },
    Next,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuarryCommand {
    Help,
    Setblock {
        pos: BlockPos,
        block: RegistryKey,
    },
    Fill {
        from: BlockPos,
        to: BlockPos,
        block: RegistryKey,
    },
    Protect {
        pos: BlockPos,
    },
    Plug {
        pos: BlockPos,
        metal: PlugMetal,
        orientation: PlugOrientation,
        stages: u8,
    },
    Network {
        points: Vec<BlockPos>,
    },
    Hit {
        pos: BlockPos,
        impact: u32,
    },
    Rubble {
        pos: BlockPos,
        action: RubbleAction,
    },
    Slab {
        pos: BlockPos,
        action: SlabAction,
    },
    Status,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub lines: Vec<String>,
}

/// Sandbox world, its block-entities and the items collected from them.
pub struct QuarrySession {
    world: SandboxWorld,
    entities: BlockEntityMap,
    codes: AllowedCodes,
    config: QuarryConfig,
    inventory: Vec<ItemStack>,
    actor: String,
    crate_code: RegistryKey,
}

impl QuarrySession {
    pub fn new(config: QuarryConfig, codes: AllowedCodes) -> anyhow::Result<Self> {
        let crate_code = RegistryKey::new(MOD_NAMESPACE, RUBBLE_STORAGE_PATH)
            .context("invalid rubble storage code")?;
        Ok(Self {
            world: SandboxWorld::with_slab_blocks(),
            entities: BlockEntityMap::new(),
            codes,
            config,
            inventory: Vec::new(),
            actor: "console".to_string(),
            crate_code,
        })
    }

    /// Replace the block-entities, e.g. with ones loaded from a store.
    pub fn restore_entities(&mut self, entities: BlockEntityMap) {
        self.entities = entities;
    }

    pub fn entities(&self) -> &BlockEntityMap {
        &self.entities
    }

    pub fn inventory(&self) -> &[ItemStack] {
        &self.inventory
    }

    pub fn world(&self) -> &SandboxWorld {
        &self.world
    }

    /// Remove and return the newest inventory item matching `pred`.
    fn take_item(&mut self, pred: impl Fn(&ItemStack) -> bool) -> Option<ItemStack> {
        let index = self.inventory.iter().rposition(pred)?;
        Some(self.inventory.remove(index))
    }

    fn collect_spawned(&mut self) {
        let spawned = self.world.take_spawned();
        self.inventory
            .extend(spawned.into_iter().map(|item| item.stack));
    }
}

pub fn execute_command(session: &mut QuarrySession, cmd: QuarryCommand) -> CommandOutput {
    let mut out = CommandOutput::default();
    match cmd {
        QuarryCommand::Help => {
            out.lines.extend(help_lines());
        }
        QuarryCommand::Setblock { pos, block } => {
            session.entities.remove(&pos);
            out.lines.push(format!("Set block at {pos} to {block}"));
            session.world.set_block(pos, block);
        }
        QuarryCommand::Fill { from, to, block } => {
            let placed = session.world.fill(from, to, &block);
            out.lines.push(format!("Filled {placed} blocks with {block}"));
        }
        QuarryCommand::Protect { pos } => {
            session.world.protect(pos);
            out.lines.push(format!("Protected {pos}"));
        }
        QuarryCommand::Plug {
            pos,
            metal,
            orientation,
            stages,
        } => {
            session
                .world
                .place_plug(pos, PlugBlock::new(metal, orientation, stages));
            session
                .entities
                .insert(pos, BlockEntityState::Plug(PlugNetwork::new()));
            out.lines.push(format!(
                "Placed {} plug at {pos} pointing {}",
                metal.code(),
                orientation.inward().code()
            ));
        }
        QuarryCommand::Network { points } => link_network(session, points, &mut out),
        QuarryCommand::Hit { pos, impact } => hit_plug(session, pos, impact, &mut out),
        QuarryCommand::Rubble { pos, action } => rubble_command(session, pos, action, &mut out),
        QuarryCommand::Slab { pos, action } => slab_command(session, pos, action, &mut out),
        QuarryCommand::Status => status_lines(session, &mut out),
    }
    out
}

fn link_network(session: &mut QuarrySession, points: Vec<BlockPos>, out: &mut CommandOutput) {
    if points.len() < 2 {
        out.lines
            .push("Error: a network needs at least two plugs".to_string());
        return;
    }
    if let Some(missing) = points.iter().find(|p| session.world.plug(**p).is_none()) {
        out.lines.push(format!("Error: no plug at {missing}"));
        return;
    }
    let Some(first) = points.first().and_then(|p| session.world.plug(*p)) else {
        return;
    };

    let sizes = &session.config.plug_sizes;
    match PlugNetwork::form(points.clone(), first.metal, sizes) {
        Some(network) => {
            let threshold = network.max_work_per_stage(&session.config.plug_work);
            for pos in &points {
                session
                    .entities
                    .insert(*pos, BlockEntityState::Plug(network.clone()));
            }
            out.lines.push(format!(
                "Linked {} plugs; {threshold} work per stage",
                points.len()
            ));
        }
        None => out.lines.push(format!(
            "Error: network too large for {} plugs (max span {})",
            first.metal.code(),
            sizes.max_span(first.metal)
        )),
    }
}

fn hit_plug(session: &mut QuarrySession, pos: BlockPos, impact: u32, out: &mut CommandOutput) {
    let Some(BlockEntityState::Plug(network)) = session.entities.get_mut(&pos) else {
        out.lines.push(format!("Error: no plug at {pos}"));
        return;
    };
    let work = &session.config.plug_work;
    let strike = network.strike(
        pos,
        impact,
        &mut session.world,
        &session.codes,
        &session.actor,
        work,
    );

    match strike {
        PlugStrike::Inactive => out
            .lines
            .push(format!("Plug at {pos} is not part of a network")),
        PlugStrike::Worked => out.lines.push(format!(
            "Hit plug at {pos} ({}/{} work)",
            network.stage_work(),
            network.max_work_per_stage(work)
        )),
        PlugStrike::StageAdvanced { complete: false } => {
            out.lines.push("Plugs advanced a stage".to_string())
        }
        PlugStrike::StageAdvanced { complete: true } => out
            .lines
            .push("Plugs at final stage; next hit splits the rock".to_string()),
        PlugStrike::Broken(outcome) => {
            session.entities.remove(&pos);
            session.collect_spawned();
            let total = outcome.quarried.total();
            match (outcome.dropped, outcome.quarried.size) {
                (Some(_), Some(size)) => out.lines.push(format!(
                    "Quarried {total} blocks into a {} slab",
                    size.code()
                )),
                _ => out
                    .lines
                    .push(format!("Quarried {total} blocks but no slab dropped")),
            }
        }
    }
}

fn rubble_command(
    session: &mut QuarrySession,
    pos: BlockPos,
    action: RubbleAction,
    out: &mut CommandOutput,
) {
    if action == RubbleAction::Place {
        if session.entities.contains_key(&pos) {
            out.lines.push(format!("Error: {pos} is occupied"));
            return;
        }
        let capacity = session.config.rubble_storage_max_size;
        let crate_code = session.crate_code.clone();
        let storage = match session.take_item(|item| item.code == crate_code) {
            Some(item) => RubbleStorage::from_drop(&RubbleDrop::read_from(&item), capacity),
            None => RubbleStorage::new(capacity),
        };
        out.lines.push(format!(
            "Placed rubble storage at {pos} ({}/{capacity})",
            storage.stock().total()
        ));
        session.world.set_block(pos, crate_code);
        session
            .entities
            .insert(pos, BlockEntityState::Rubble(storage));
        return;
    }

    let Some(BlockEntityState::Rubble(storage)) = session.entities.get_mut(&pos) else {
        out.lines.push(format!("Error: no rubble storage at {pos}"));
        return;
    };

    match action {
        RubbleAction::Place => {}
        RubbleAction::Add { item, count } => {
            let mut held = ItemStack::new(item.clone(), count);
            if storage.add_from(&mut held, count, &session.codes) {
                out.lines.push(format!(
                    "Stored {}× {item} ({}/{})",
                    count - held.count,
                    storage.stock().total(),
                    storage.stock().capacity()
                ));
            } else {
                out.lines.push(format!("Error: storage refused {item}"));
            }
        }
        RubbleAction::AddAll => {
            let mut slots: Vec<Option<ItemStack>> =
                session.inventory.drain(..).map(Some).collect();
            let added = storage.add_all(&mut slots, &session.codes);
            session.inventory = slots.into_iter().flatten().collect();
            if added {
                out.lines.push(format!(
                    "Stored inventory rubble ({}/{})",
                    storage.stock().total(),
                    storage.stock().capacity()
                ));
            } else {
                out.lines.push("Nothing in the inventory fits".to_string());
            }
        }
        RubbleAction::Take { tier, count } => {
            match storage.take(tier, count, session.config.rubble_take_batch, &session.codes) {
                Some(stack) => {
                    out.lines
                        .push(format!("Took {}× {}", stack.count, stack.code));
                    session.inventory.push(stack);
                }
                None => out.lines.push(format!("Error: no {} to take", tier.code())),
            }
        }
        RubbleAction::Hammer => {
            if storage.degrade_next(session.config.degrade_split) {
                let counts = storage.stock().counts();
                out.lines.push(format!(
                    "Hammered: stone={} gravel={} sand={}",
                    counts.stone, counts.gravel, counts.sand
                ));
            } else {
                out.lines.push("Nothing to hammer".to_string());
            }
        }
        RubbleAction::Lock { tier } => {
            let lock = storage.toggle_lock(tier);
            out.lines.push(format!("Storage lock: {lock:?}"));
        }
        RubbleAction::Break => {
            let carried = storage.stock().total();
            let mut item = ItemStack::new(session.crate_code.clone(), 1);
            storage.drop_descriptor().write_to(&mut item);
            session.entities.remove(&pos);
            session.world.break_block(pos);
            session.inventory.push(item);
            out.lines.push(format!(
                "Broke rubble storage at {pos}; carried {carried} units"
            ));
        }
    }
}

fn is_slab_item(item: &ItemStack) -> bool {
    item.code.namespace() == MOD_NAMESPACE && item.code.path().starts_with(SLAB_PATH_PREFIX)
}

fn slab_command(
    session: &mut QuarrySession,
    pos: BlockPos,
    action: SlabAction,
    out: &mut CommandOutput,
) {
    if action == SlabAction::Place {
        if session.entities.contains_key(&pos) {
            out.lines.push(format!("Error: {pos} is occupied"));
            return;
        }
        let Some(item) = session.take_item(is_slab_item) else {
            out.lines.push("Error: no slab in the inventory".to_string());
            return;
        };
        let contents = SlabContents::read_from(&item);
        out.lines.push(format!(
            "Placed slab at {pos} holding {} units",
            contents.total()
        ));
        session.world.set_block(pos, item.code);
        session
            .entities
            .insert(pos, BlockEntityState::Slab(contents));
        return;
    }

    let Some(BlockEntityState::Slab(contents)) = session.entities.get_mut(&pos) else {
        out.lines.push(format!("Error: no slab at {pos}"));
        return;
    };

    match action {
        SlabAction::Place => {}
        SlabAction::Next => {
            contents.next_slot();
            let selected = contents
                .current_rock()
                .map(ToString::to_string)
                .unwrap_or_else(|| "nothing".to_string());
            out.lines.push(format!("Slab selection: {selected}"));
        }
        SlabAction::Cut {
            drop_type,
            quantity,
            seconds,
        } => {
            let config = &session.config;
            let seconds = seconds.unwrap_or(config.slab_interaction_time);
            let tool = SlabTool {
                drop_type,
                quantity,
            };
            match contents.interact_stop(seconds, Some(&tool), config, &session.codes) {
                SlabCut::Nothing => {
                    if SlabContents::interact_step(seconds, config) {
                        out.lines
                            .push(format!("Released after {seconds:.2}s; nothing cut"));
                    } else {
                        out.lines.push("Nothing to cut".to_string());
                    }
                }
                SlabCut::Piece(stack) => {
                    out.lines
                        .push(format!("Cut {}× {}", stack.count, stack.code));
                    session.inventory.push(stack);
                }
                SlabCut::LastPiece(stack) => {
                    out.lines.push(format!(
                        "Cut {}× {}; slab used up",
                        stack.count, stack.code
                    ));
                    session.inventory.push(stack);
                    session.entities.remove(&pos);
                    session.world.break_block(pos);
                }
            }
        }
    }
}

fn status_lines(session: &QuarrySession, out: &mut CommandOutput) {
    if session.entities.is_empty() {
        out.lines.push("No block-entities".to_string());
    }
    for (pos, state) in &session.entities {
        let line = match state {
            BlockEntityState::Rubble(storage) => {
                let stock = storage.stock();
                let counts = stock.counts();
                let rock = stock
                    .locked_rock()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "empty".to_string());
                format!(
                    "{pos} rubble {rock} stone={} gravel={} sand={} lock={:?}",
                    counts.stone,
                    counts.gravel,
                    counts.sand,
                    storage.lock()
                )
            }
            BlockEntityState::Plug(network) => format!(
                "{pos} plug points={} work={} complete={}",
                network.points().len(),
                network.stage_work(),
                network.is_complete(&session.world)
            ),
            BlockEntityState::Slab(contents) => format!(
                "{pos} slab units={} stacks={}",
                contents.total(),
                contents.stacks().len()
            ),
        };
        out.lines.push(line);
    }
    let items: Vec<String> = session
        .inventory
        .iter()
        .map(|item| format!("{}× {}", item.count, item.code))
        .collect();
    if items.is_empty() {
        out.lines.push("Inventory: empty".to_string());
    } else {
        out.lines.push(format!("Inventory: {}", items.join(", ")));
    }
}

pub fn parse_command(input: &str) -> Result<QuarryCommand, CommandError> {
    let input = input.trim();
    let input = input.strip_prefix('/').unwrap_or(input).trim();
    if input.is_empty() {
        return Ok(QuarryCommand::Help);
    }

    let mut parts = input.split_whitespace();
    let cmd = parts
        .next()
        .ok_or_else(|| CommandError::new("Missing command"))?
        .to_ascii_lowercase();
    let args: Vec<&str> = parts.collect();

    match cmd.as_str() {
        "help" | "?" => Ok(QuarryCommand::Help),
        "status" => Ok(QuarryCommand::Status),
        "setblock" => {
            if args.len() != 4 {
                return Err(CommandError::new("Usage: /setblock <x> <y> <z> <block>"));
            }
            Ok(QuarryCommand::Setblock {
                pos: parse_pos(&args[..3])?,
                block: parse_key(args[3])?,
            })
        }
        "fill" => {
            if args.len() != 7 {
                return Err(CommandError::new(
                    "Usage: /fill <x1> <y1> <z1> <x2> <y2> <z2> <block>",
                ));
            }
            Ok(QuarryCommand::Fill {
                from: parse_pos(&args[..3])?,
                to: parse_pos(&args[3..6])?,
                block: parse_key(args[6])?,
            })
        }
        "protect" => Ok(QuarryCommand::Protect {
            pos: parse_pos(&args).map_err(|_| CommandError::new("Usage: /protect <x> <y> <z>"))?,
        }),
        "plug" => parse_plug_command(&args),
        "network" => {
            if args.len() < 6 || args.len() % 3 != 0 {
                return Err(CommandError::new(
                    "Usage: /network <x> <y> <z> <x> <y> <z> [<x> <y> <z> ...]",
                ));
            }
            let points = args
                .chunks(3)
                .map(parse_pos)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(QuarryCommand::Network { points })
        }
        "hit" => {
            if !(3..=4).contains(&args.len()) {
                return Err(CommandError::new("Usage: /hit <x> <y> <z> [impact]"));
            }
            let impact = match args.get(3) {
                Some(raw) => {
                    parse_positive_u32(raw).map_err(|_| CommandError::new("Invalid impact"))?
                }
                None => DEFAULT_IMPACT,
            };
            Ok(QuarryCommand::Hit {
                pos: parse_pos(&args[..3])?,
                impact,
            })
        }
        "rubble" => parse_rubble_command(&args),
        "slab" => parse_slab_command(&args),
        _ => Err(CommandError::new(format!(
            "Unknown command: {cmd}. Try /help"
        ))),
    }
}

fn parse_positive_u32(s: &str) -> Result<u32, ()> {
    let value = s.parse::<u32>().map_err(|_| ())?;
    if value == 0 {
        return Err(());
    }
    Ok(value)
}

fn parse_block_coord(s: &str) -> Result<i32, CommandError> {
    s.trim()
        .parse::<i32>()
        .map_err(|_| CommandError::new(format!("Invalid block coordinate: {s}")))
}

fn parse_pos(args: &[&str]) -> Result<BlockPos, CommandError> {
    let [x, y, z] = args else {
        return Err(CommandError::new("Expected <x> <y> <z>"));
    };
    Ok(BlockPos::new(
        parse_block_coord(x)?,
        parse_block_coord(y)?,
        parse_block_coord(z)?,
    ))
}

fn parse_key(token: &str) -> Result<RegistryKey, CommandError> {
    RegistryKey::parse(token).map_err(|err| CommandError::new(format!("Invalid code {token}: {err}")))
}

fn parse_tier(token: &str) -> Result<MaterialTier, CommandError> {
    MaterialTier::from_code(&token.to_ascii_lowercase())
        .ok_or_else(|| CommandError::new("Tier must be stone, gravel or sand"))
}

fn parse_count(args: &[&str], index: usize) -> Result<u32, CommandError> {
    match args.get(index) {
        Some(raw) => parse_positive_u32(raw).map_err(|_| CommandError::new("Invalid count")),
        None => Ok(1),
    }
}

fn parse_plug_command(args: &[&str]) -> Result<QuarryCommand, CommandError> {
    const USAGE: &str = "Usage: /plug <x> <y> <z> <metal> <down|up|north|east|south|west> [stages]";
    if !(5..=6).contains(&args.len()) {
        return Err(CommandError::new(USAGE));
    }
    let pos = parse_pos(&args[..3])?;
    let metal = PlugMetal::from_code(&args[3].to_ascii_lowercase())
        .ok_or_else(|| CommandError::new(format!("Unknown plug metal: {}", args[3])))?;
    let orientation = match Facing::from_code(&args[4].to_ascii_lowercase()) {
        Some(Facing::Down) => PlugOrientation::Down,
        Some(Facing::Up) => PlugOrientation::Up,
        Some(facing) => PlugOrientation::Horizontal(facing),
        None => return Err(CommandError::new(USAGE)),
    };
    let stages = match args.get(5) {
        Some(raw) => raw
            .parse::<u8>()
            .ok()
            .filter(|stages| *stages > 0)
            .ok_or_else(|| CommandError::new("Invalid stage count"))?,
        None => DEFAULT_PLUG_STAGES,
    };
    Ok(QuarryCommand::Plug {
        pos,
        metal,
        orientation,
        stages,
    })
}

fn parse_rubble_command(args: &[&str]) -> Result<QuarryCommand, CommandError> {
    const USAGE: &str =
        "Usage: /rubble <place|add|addall|take|hammer|lock|break> <x> <y> <z> [args]";
    if args.len() < 4 {
        return Err(CommandError::new(USAGE));
    }
    let sub = args[0].to_ascii_lowercase();
    let pos = parse_pos(&args[1..4])?;
    let rest = &args[4..];
    let action = match (sub.as_str(), rest.len()) {
        ("place", 0) => RubbleAction::Place,
        ("add", 1..=2) => RubbleAction::Add {
            item: parse_key(rest[0])?,
            count: parse_count(rest, 1)?,
        },
        ("addall", 0) => RubbleAction::AddAll,
        ("take", 1..=2) => RubbleAction::Take {
            tier: parse_tier(rest[0])?,
            count: parse_count(rest, 1)?,
        },
        ("hammer", 0) => RubbleAction::Hammer,
        ("lock", 1) => RubbleAction::Lock {
            tier: parse_tier(rest[0])?,
        },
        ("break", 0) => RubbleAction::Break,
        _ => return Err(CommandError::new(USAGE)),
    };
    Ok(QuarryCommand::Rubble { pos, action })
}

fn parse_slab_command(args: &[&str]) -> Result<QuarryCommand, CommandError> {
    const USAGE: &str =
        "Usage: /slab <place|next> <x> <y> <z> | /slab cut <x> <y> <z> <droptype> [quantity] [seconds]";
    if args.len() < 4 {
        return Err(CommandError::new(USAGE));
    }
    let sub = args[0].to_ascii_lowercase();
    let pos = parse_pos(&args[1..4])?;
    let rest = &args[4..];
    let action = match (sub.as_str(), rest.len()) {
        ("place", 0) => SlabAction::Place,
        ("next", 0) => SlabAction::Next,
        ("cut", 1..=3) => {
            let drop_type = SlabDropType::from_code(&rest[0].to_ascii_lowercase())
                .ok_or_else(|| {
                    CommandError::new("Drop type must be rock, rockpolished, stone or stonebrick")
                })?;
            let seconds = match rest.get(2) {
                Some(raw) => Some(
                    raw.parse::<f32>()
                        .ok()
                        .filter(|s| s.is_finite() && *s >= 0.0)
                        .ok_or_else(|| CommandError::new("Invalid hold time"))?,
                ),
                None => None,
            };
            SlabAction::Cut {
                drop_type,
                quantity: parse_count(rest, 1)?,
                seconds,
            }
        }
        _ => return Err(CommandError::new(USAGE)),
    };
    Ok(QuarryCommand::Slab { pos, action })
}

fn help_lines() -> Vec<String> {
    vec![
        "Commands:".to_string(),
        "  /help".to_string(),
        "  /setblock <x> <y> <z> <block>".to_string(),
        "  /fill <x1> <y1> <z1> <x2> <y2> <z2> <block>".to_string(),
        "  /protect <x> <y> <z>          (nobody may break the block)".to_string(),
        "  /plug <x> <y> <z> <metal> <down|up|north|east|south|west> [stages]".to_string(),
        "  /network <x> <y> <z> <x> <y> <z> [...]   (first two points are corners)".to_string(),
        "  /hit <x> <y> <z> [impact]".to_string(),
        "  /rubble place|addall|hammer|break <x> <y> <z>".to_string(),
        "  /rubble add <x> <y> <z> <item> [count]".to_string(),
        "  /rubble take <x> <y> <z> <stone|gravel|sand> [count]".to_string(),
        "  /rubble lock <x> <y> <z> <stone|gravel|sand>".to_string(),
        "  /slab place|next <x> <y> <z>".to_string(),
        "  /slab cut <x> <y> <z> <rock|rockpolished|stone|stonebrick> [quantity] [seconds]"
            .to_string(),
        "  /status".to_string(),
    ]
}
