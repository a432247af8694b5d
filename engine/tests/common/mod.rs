#![allow(dead_code)]

use tcg_rules_engine::data::card::*;
use tcg_rules_engine::data::catalog::CardCatalog;
use tcg_rules_engine::effects::conditions::StandardConditions;
use tcg_rules_engine::effects::mechanics::*;
use tcg_rules_engine::effects::text::PatternInterpreter;
use tcg_rules_engine::game::actions::{Action, ActionRecord};
use tcg_rules_engine::game::coin::*;
use tcg_rules_engine::game::state::*;
use tcg_rules_engine::{EngineConfig, EngineResult, MatchEngine};

pub const P1: PlayerId = PlayerId::Player1;
pub const P2: PlayerId = PlayerId::Player2;

fn make_basic(id: &str, name: &str, hp: u32, energy: EnergyType, attacks: Vec<Attack>) -> Card {
    let mut card = Card::pokemon(id, name, Stage::Basic, hp, energy);
    card.attacks = attacks;
    card
}

/// The test card pool.
pub fn test_cards() -> Vec<Card> {
    let mut pikachu = make_basic(
        "pikachu",
        "Pikachu",
        60,
        EnergyType::Lightning,
        vec![Attack::new("Gnaw", vec![EnergyType::Colorless], "20")],
    );
    pikachu.weakness = Some(EnergyType::Fighting);

    let mut charmander = make_basic(
        "charmander",
        "Charmander",
        70,
        EnergyType::Fire,
        vec![
            Attack::new(
                "Ember",
                vec![EnergyType::Fire, EnergyType::Fire, EnergyType::Colorless],
                "50",
            )
            .with_effect(AttackEffect::DiscardEnergy {
                target: EffectTarget::SelfActive,
                count: 1,
                energy_type: Some(EnergyType::Fire),
                conditions: vec![],
            }),
            Attack::new("Scratch", vec![EnergyType::Colorless], "10"),
        ],
    );
    charmander.weakness = Some(EnergyType::Water);

    let mut charmeleon = Card::pokemon("charmeleon", "Charmeleon", Stage::Stage1, 90, EnergyType::Fire);
    charmeleon.evolves_from = Some("Charmander".to_string());
    charmeleon.attacks = vec![Attack::new("Slash", vec![EnergyType::Colorless], "40")];

    let squirtle = make_basic(
        "squirtle",
        "Squirtle",
        70,
        EnergyType::Water,
        vec![Attack::new("Hydro Pump", vec![EnergyType::Water, EnergyType::Water], "30+")
            .with_text("This attack does 10 more damage for each Water Energy attached to this Pokémon.")
            .with_bonus_cap(2)],
    );

    let machop = make_basic(
        "machop",
        "Machop",
        70,
        EnergyType::Fighting,
        vec![
            Attack::new("Grudge Punch", vec![EnergyType::Colorless], "50-")
                .with_text("This attack does 10 less damage for each damage counter on your opponent's Active Pokémon."),
            Attack::new("Karate Chop", vec![EnergyType::Colorless], "30"),
        ],
    );

    let mut bulbasaur = make_basic(
        "bulbasaur",
        "Bulbasaur",
        80,
        EnergyType::Grass,
        vec![Attack::new("Vine Whip", vec![EnergyType::Grass], "20")],
    );
    bulbasaur.resistance = Some(Resistance {
        energy_type: EnergyType::Water,
        amount: 20,
    });

    let meowth = make_basic(
        "meowth",
        "Meowth",
        60,
        EnergyType::Colorless,
        vec![
            Attack::new("Pay Day", vec![EnergyType::Colorless], "20×").with_coin_flip(CoinFlipConfiguration {
                damage_per_head: 20,
                ..CoinFlipConfiguration::new(FlipCount::Fixed(2), DamageCalculation::MultiplyByHeads)
            }),
            Attack::new("Fury Swipes", vec![EnergyType::Colorless], "10×").with_coin_flip(CoinFlipConfiguration {
                damage_per_head: 10,
                ..CoinFlipConfiguration::new(FlipCount::UntilTails, DamageCalculation::MultiplyByHeads)
            }),
        ],
    );

    let weedle = make_basic(
        "weedle",
        "Weedle",
        50,
        EnergyType::Grass,
        vec![Attack::new("Poison Sting", vec![EnergyType::Colorless], "10").with_effect(
            AttackEffect::ApplyStatus {
                status: StatusCondition::Poisoned,
                target: EffectTarget::OpponentActive,
                conditions: vec![],
                poison_damage: None,
            },
        )],
    );

    let oddish = make_basic(
        "oddish",
        "Oddish",
        60,
        EnergyType::Grass,
        vec![Attack::new("Stun Spore", vec![EnergyType::Colorless], "10").with_effect(
            AttackEffect::ApplyStatus {
                status: StatusCondition::Paralyzed,
                target: EffectTarget::OpponentActive,
                conditions: vec![],
                poison_damage: None,
            },
        )],
    );

    let vulpix = make_basic(
        "vulpix",
        "Vulpix",
        60,
        EnergyType::Fire,
        vec![Attack::new("Flare", vec![EnergyType::Colorless], "10")
            .with_text("Your opponent's Active Pokémon is now Burned.")],
    );

    let jigglypuff = make_basic(
        "jigglypuff",
        "Jigglypuff",
        70,
        EnergyType::Colorless,
        vec![Attack::new("Sing", vec![EnergyType::Colorless], "").with_effect(AttackEffect::ApplyStatus {
            status: StatusCondition::Asleep,
            target: EffectTarget::OpponentActive,
            conditions: vec![],
            poison_damage: None,
        })],
    );

    let magnemite = make_basic(
        "magnemite",
        "Magnemite",
        60,
        EnergyType::Lightning,
        vec![
            Attack::new("Self Spark", vec![EnergyType::Colorless], "40")
                .with_text("This Pokémon also does 10 damage to itself."),
            Attack::new("Thunder Spread", vec![EnergyType::Colorless], "20")
                .with_text("This attack also does 10 damage to each of your opponent's Benched Pokémon."),
        ],
    );

    let shellder = make_basic(
        "shellder",
        "Shellder",
        60,
        EnergyType::Water,
        vec![Attack::new("Shell Guard", vec![EnergyType::Colorless], "10").with_effect(
            AttackEffect::ReduceDamage {
                amount: 20,
                conditions: vec![],
            },
        )],
    );

    let volcanion = make_basic(
        "volcanion",
        "Volcanion",
        110,
        EnergyType::Fire,
        vec![Attack::new("Steam Artillery", vec![EnergyType::Fire, EnergyType::Water], "40")
            .with_effect(AttackEffect::DiscardEnergy {
                target: EffectTarget::SelfActive,
                count: 1,
                energy_type: Some(EnergyType::Fire),
                conditions: vec![],
            })
            .with_effect(AttackEffect::DiscardEnergy {
                target: EffectTarget::SelfActive,
                count: 1,
                energy_type: Some(EnergyType::Water),
                conditions: vec![],
            })],
    );

    let mut mewtwo = make_basic(
        "mewtwo-ex",
        "Mewtwo ex",
        150,
        EnergyType::Psychic,
        vec![Attack::new("Psydrive", vec![EnergyType::Psychic], "80")],
    );
    mewtwo.is_ex = true;

    let mut chansey = make_basic("chansey", "Chansey", 120, EnergyType::Colorless, vec![]);
    chansey.ability = Some(Ability {
        name: "Soft Touch".to_string(),
        description: "Heal 20 damage from this Pokémon.".to_string(),
        effects: vec![AbilityEffect::Heal { amount: 20 }],
    });

    vec![
        pikachu,
        charmander,
        charmeleon,
        squirtle,
        machop,
        bulbasaur,
        meowth,
        weedle,
        oddish,
        vulpix,
        jigglypuff,
        magnemite,
        shellder,
        volcanion,
        mewtwo,
        chansey,
        Card::basic_energy("fire-energy", EnergyType::Fire),
        Card::basic_energy("water-energy", EnergyType::Water),
        Card::basic_energy("lightning-energy", EnergyType::Lightning),
        Card::basic_energy("grass-energy", EnergyType::Grass),
        Card::basic_energy("psychic-energy", EnergyType::Psychic),
        Card::special_energy("rainbow-energy", vec![EnergyType::Fire, EnergyType::Water], 1),
    ]
}

/// Catalog and config; builds engines on demand.
pub struct Table {
    pub catalog: CardCatalog,
    pub config: EngineConfig,
}

impl Table {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Table {
            catalog: CardCatalog::new(test_cards()),
            config,
        }
    }

    pub fn engine<R>(&self, f: impl FnOnce(&MatchEngine<'_>) -> R) -> R {
        let conditions = StandardConditions::new(&self.catalog);
        let interpreter = PatternInterpreter::new();
        let engine = MatchEngine::new(&self.catalog, &conditions, &interpreter, &self.config);
        f(&engine)
    }

    pub fn card(&self, id: &str) -> &Card {
        self.catalog.get_by_id(id).unwrap()
    }

    /// A match in player 1's main phase on turn 2 with the given actives.
    /// Player 2 went first, so neither side is on its first turn.
    pub fn battle(&self, p1_active: &str, p2_active: &str) -> GameState {
        let mut state = GameState::new("test-match");
        state.match_state = MatchState::PlayerTurn;
        state.first_player = P2;
        state.current_player = P1;
        state.turn_number = 2;
        state.phase = TurnPhase::MainPhase;

        for (player, card_id) in [(P1, p1_active), (P2, p2_active)] {
            let id = state.allocate_instance_id(player);
            let card = self.card(card_id).clone();
            let side = state.player_mut(player);
            side.active = Some(CardInstance::new(id, &card, PokemonPosition::Active, 1));
            side.deck = vec!["grass-energy".to_string(); 10];
            side.prize_cards = vec!["grass-energy".to_string(); 6];
        }
        state
    }

    /// Put a benched Pokemon directly into play.
    pub fn bench(&self, state: &mut GameState, player: PlayerId, card_id: &str) -> String {
        let id = state.allocate_instance_id(player);
        let card = self.card(card_id).clone();
        let side = state.player_mut(player);
        let slot = side.bench.len();
        side.bench
            .push(CardInstance::new(id.clone(), &card, PokemonPosition::Bench(slot), 1));
        id
    }
}

/// Attach energy cards straight onto a player's active Pokemon.
pub fn attach(state: &mut GameState, player: PlayerId, energy: &[&str]) {
    let active = state.player_mut(player).active.as_mut().unwrap();
    active
        .attached_energy
        .extend(energy.iter().map(|e| e.to_string()));
}

pub fn active(state: &GameState, player: PlayerId) -> &CardInstance {
    state.player(player).active.as_ref().unwrap()
}

/// Applies actions in order with generated ids and keeps the log.
pub struct Script<'e, 'a> {
    engine: &'e MatchEngine<'a>,
    pub state: GameState,
    pub log: Vec<ActionRecord>,
}

impl<'e, 'a> Script<'e, 'a> {
    pub fn new(engine: &'e MatchEngine<'a>, state: GameState) -> Self {
        Script {
            engine,
            state,
            log: Vec::new(),
        }
    }

    pub fn act(&mut self, player: PlayerId, action: Action) -> EngineResult<()> {
        let action_id = format!("act-{}", self.log.len() + 1);
        self.state = self.engine.apply_action(&self.state, player, &action_id, &action)?;
        self.log.push(ActionRecord::new(action_id, player, action));
        Ok(())
    }

    pub fn both(&mut self, action: Action) {
        self.act(P1, action.clone()).unwrap();
        self.act(P2, action).unwrap();
    }
}

/// A 20-card deck: 12 basics and 8 energy.
pub fn test_deck() -> Vec<String> {
    let mut cards = Vec::new();
    for id in ["pikachu", "machop", "bulbasaur", "weedle"] {
        for _ in 0..3 {
            cards.push(id.to_string());
        }
    }
    for _ in 0..4 {
        cards.push("lightning-energy".to_string());
        cards.push("grass-energy".to_string());
    }
    cards
}

/// Run both players through setup, picking the first basic in hand as active.
pub fn play_setup(table: &Table, script: &mut Script<'_, '_>) {
    script.both(Action::JoinMatch);
    script.both(Action::SubmitDeck { cards: test_deck() });
    script.both(Action::ApproveMatch);
    script.both(Action::ShuffleDeck);
    script.both(Action::DrawInitialCards);
    script.both(Action::SetPrizeCards);
    for player in PlayerId::BOTH {
        let basic = script
            .state
            .player(player)
            .hand
            .iter()
            .find(|id| table.card(id).is_basic_pokemon())
            .cloned()
            .unwrap();
        script
            .act(
                player,
                Action::SetActivePokemon {
                    source: tcg_rules_engine::game::actions::ActiveSource::Hand(basic),
                },
            )
            .unwrap();
    }
    script.both(Action::CompleteSetup);
    script.act(P1, Action::SelectFirstPlayer).unwrap();
}
