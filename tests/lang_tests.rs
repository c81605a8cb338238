/// Language-aware rendering: agreement through `LangConfig`, list joining
/// and lexicons loaded from RON.

use aida::{
    render, render_with, Ctx, Enumeration, Expr, Feature, Features, GNumber, GPerson, Gender,
    Lang, LangConfig, Lexicon, Node, PhraseElement, RenderError, Renderer,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const LEXICON: &str = r#"{
    "subject": Phrase(
        base: "I",
        mappings: [
            (text: "we", features: [Number(Plural), Person(First), Lang(English)]),
            (text: "I", features: [Number(Singular), Person(First), Lang(English)]),
            (text: "he", features: [Number(Singular), Person(Third), Gender(Male), Lang(English)]),
            (text: "she", features: [Number(Singular), Person(Third), Gender(Female), Lang(English)]),
            (text: "eu", features: [Number(Singular), Person(First), Lang(Portuguese)]),
            (text: "nós", features: [Number(Plural), Person(First), Lang(Portuguese)]),
        ],
    ),
    "make": Phrase(
        base: "make",
        kind: Verb,
        mappings: [
            (text: "make", features: [Person(First), Lang(English)]),
            (text: "makes", features: [Number(Singular), Person(Third), Lang(English)]),
            (text: "faço", features: [Number(Singular), Person(First), Lang(Portuguese)]),
            (text: "fazemos", features: [Number(Plural), Person(First), Lang(Portuguese)]),
        ],
    ),
    "cake": Phrase(
        base: "a cake",
        mappings: [
            (text: "a cake", features: [Lang(English)]),
            (text: "um bolo", features: [Lang(Portuguese)]),
        ],
    ),
}"#;

fn cake_sentence(lex: &Lexicon) -> Node {
    let subject = lex.node("subject").unwrap();
    let make = lex.node("make").unwrap();
    let cake = lex.node("cake").unwrap();
    subject.then(make).then(cake).sentence()
}

#[test]
fn cake_batch_over_features() {
    init_logging();
    let lex = Lexicon::parse_ron(LEXICON).unwrap();
    let conf = LangConfig::new(cake_sentence(&lex));

    let cases = [
        (Lang::English, GNumber::Singular, GPerson::First, Gender::Neutral, "I make a cake."),
        (Lang::English, GNumber::Plural, GPerson::First, Gender::Neutral, "We make a cake."),
        (Lang::English, GNumber::Singular, GPerson::Third, Gender::Male, "He makes a cake."),
        (Lang::English, GNumber::Singular, GPerson::Third, Gender::Female, "She makes a cake."),
        (Lang::Portuguese, GNumber::Singular, GPerson::First, Gender::Neutral, "Eu faço um bolo."),
        (Lang::Portuguese, GNumber::Plural, GPerson::First, Gender::Neutral, "Nós fazemos um bolo."),
    ];

    let mut ctx = Ctx::new();
    for (lang, number, person, gender, expected) in cases {
        conf.set_features(Features::new(lang, number, person, gender));
        assert_eq!(render_with(&conf, &mut ctx).unwrap(), expected);
    }
}

#[test]
fn enumeration_follows_ambient_language() {
    init_logging();
    let list = Enumeration::ambient(["Alice", "Bob", "Chris"]);
    let conf = LangConfig::new(Node::from(list).sentence());

    assert_eq!(render(&conf).unwrap(), "Alice, Bob, and Chris.");

    conf.set_lang(Lang::Portuguese);
    assert_eq!(render(&conf).unwrap(), "Alice, Bob e Chris.");
}

#[test]
fn fixed_enumeration_ignores_ambient_language() {
    init_logging();
    let list = Enumeration::with_tag(["Alice", "Bob"], "en-US").unwrap();
    let conf = LangConfig::with_tag(list, "pt-BR").unwrap();
    assert_eq!(render(&conf).unwrap(), "Alice and Bob");
}

#[test]
fn enumeration_items_can_be_trees() {
    init_logging();
    let hero = Node::constant("Geralt").then("of Rivia");
    let list = Enumeration::new([hero, Node::constant("Ciri")], Lang::English);
    assert_eq!(render(list).unwrap(), "Geralt of Rivia and Ciri");
}

#[test]
fn unknown_tags_are_rejected() {
    init_logging();
    assert!(matches!(
        Enumeration::with_tag(["a"], "fr"),
        Err(RenderError::UnsupportedLanguage(_))
    ));
    assert!(matches!(
        LangConfig::with_tag(Node::empty(), "fr"),
        Err(RenderError::UnsupportedLanguage(_))
    ));
}

#[test]
fn renderer_default_features_without_config() {
    init_logging();
    let we = PhraseElement::noun("I")
        .add_mapping("we", &[Feature::Number(GNumber::Plural)])
        .add_mapping("I", &[Feature::Number(GNumber::Singular)]);

    let plural = Renderer::builder()
        .features(Features {
            number: GNumber::Plural,
            ..Features::default()
        })
        .build();

    assert_eq!(render(we.clone()).unwrap(), "I");
    assert_eq!(plural.render(we, &mut Ctx::new()).unwrap(), "we");
}

#[test]
fn lexicon_merge_overrides_by_name() {
    init_logging();
    let mut lex = Lexicon::parse_ron(LEXICON).unwrap();
    let extra = Lexicon::parse_ron(
        r#"{
            "cake": Phrase(
                base: "a pie",
                mappings: [(text: "uma torta", features: [Lang(Portuguese)])],
            ),
        }"#,
    )
    .unwrap();
    lex.merge(extra);
    assert_eq!(lex.len(), 3);

    let conf = LangConfig::new(cake_sentence(&lex));
    assert_eq!(render(&conf).unwrap(), "I make a pie.");
    conf.set_lang(Lang::Portuguese);
    assert_eq!(render(&conf).unwrap(), "Eu faço uma torta.");
}
