use kblite::{KnowledgeBase, Statement, TracingSink};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut kb = KnowledgeBase::with_trace(Box::new(TracingSink));

    // 1) every dog is a mammal
    kb.assert_rule(
        vec![Statement::parse("isa", ["?x", "dog"])],
        Statement::parse("isa", ["?x", "mammal"]),
    )?;

    // 2) fido is a dog
    kb.assert_fact(Statement::parse("isa", ["fido", "dog"]));

    // 3) who is a mammal?
    let query = Statement::parse("isa", ["?y", "mammal"]);
    for env in kb.ask(&query)? {
        println!("{env}");
    }

    // 4) retract the dog fact; the derived mammal fact goes with it
    kb.retract_fact(&Statement::parse("isa", ["fido", "dog"]))?;
    println!("mammals after retraction: {}", kb.ask(&query)?.len());

    Ok(())
}
