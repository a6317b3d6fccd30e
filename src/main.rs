use clap::{Args, Parser, Subcommand};
use cpc_core::{ChainParams, CopyrightPayload, CopyrightType, Node, UtxoKind};
use cpc_wallet::Wallet;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "cpc-chain")]
#[command(about = "Time-Rights Chain (CPC) - blockchain de direitos autorais")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Executa a demonstração do ciclo de vida completo (registro -> sublicença)
    Demo(DemoArgs),
    /// Inicia um nó minerador
    Mine(MineArgs),
    /// Exibe informações de versão
    Version,
}

#[derive(Args)]
struct DemoArgs {
    /// Dificuldade da prova de trabalho (dígitos hexadecimais zero)
    #[arg(long, default_value = "2")]
    difficulty: u32,
}

#[derive(Args)]
struct MineArgs {
    /// Dificuldade da prova de trabalho (dígitos hexadecimais zero)
    #[arg(long, default_value = "4")]
    difficulty: u32,

    /// Chave privada do minerador em hexadecimal (gera uma nova se omitida)
    #[arg(long)]
    miner_secret: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

type CliResult = std::result::Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> CliResult {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Demo(args)) => demo_lifecycle(args),
        Some(Commands::Mine(args)) => mine_node(args).await,
        Some(Commands::Version) => {
            show_version();
            Ok(())
        }
        None => demo_lifecycle(&DemoArgs { difficulty: 2 }),
    }
}

async fn mine_node(args: &MineArgs) -> CliResult {
    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let miner = match &args.miner_secret {
        Some(secret) => Wallet::from_secret_hex(secret)?,
        None => Wallet::generate(),
    };

    let params = ChainParams {
        difficulty: args.difficulty,
        ..ChainParams::default()
    };
    let node = Node::new(miner.address(), params)?;

    info!("⛏️ Nó CPC iniciado");
    info!("🔑 Endereço do minerador: {}", miner.address());
    info!("🎯 Dificuldade: {} dígitos zero", args.difficulty);

    let worker = node.spawn_miner();

    tokio::signal::ctrl_c().await?;
    info!("🛑 Desligamento solicitado");
    node.shutdown();
    let _ = worker.join();

    let status = node.status();
    info!(
        "📏 Altura final: {} | pendentes: {}",
        status.height, status.pending
    );

    Ok(())
}

fn show_version() {
    println!("⛓️ Time-Rights Chain (CPC) v0.1.0");
    println!("Blockchain UTXO com estado de direitos autorais");
    println!();
    println!("Componentes:");
    println!("  ✅ Motor de estado por varredura de blocos");
    println!("  ✅ Validador com máquina de estados de copyright");
    println!("  ✅ Mineração PoW com coinbase e taxas");
    println!("  ✅ Carteira multi-parte");
}

fn demo_lifecycle(args: &DemoArgs) -> CliResult {
    println!("⛓️ Time-Rights Chain (CPC) - demonstração do ciclo de vida");
    println!("==========================================================");

    // 1. Nó com carteira do minerador
    println!("\n1. Criando nó e carteiras...");
    let miner = Wallet::generate();
    let params = ChainParams {
        difficulty: args.difficulty,
        ..ChainParams::default()
    };
    let node = Node::new(miner.address(), params)?;

    let alice = Wallet::generate();
    let bob = Wallet::generate();
    let carol = Wallet::generate();
    println!("   ⛏️ Minerador: {}...", &miner.address()[..16]);
    println!("   🎤 Alice (autora): {}...", &alice.address()[..16]);
    println!("   🏢 Bob (licenciado): {}...", &bob.address()[..16]);
    println!("   🏬 Carol (sublicenciada): {}...", &carol.address()[..16]);

    // 2. Torneira
    println!("\n2. Alice e Bob pedem CPC à torneira...");
    node.request_faucet(&alice.address())?;
    node.request_faucet(&bob.address())?;
    node.mine_pending()?;
    println!(
        "   💰 Alice: {} CPC | Bob: {} CPC",
        node.address_summary(&alice.address()).balance,
        node.address_summary(&bob.address()).balance
    );

    // 3. Registro da obra
    println!("\n3. Alice registra a obra...");
    let song = "Sob o céu estrelado nos encontramos";
    let work_hash = Wallet::work_fingerprint(song.as_bytes());
    println!("   📝 Hash da obra: {}...", &work_hash[..16]);

    let fuel = find_fuel(&node, &alice.address());
    let register = alice.register_copyright(
        &fuel,
        work_hash.clone(),
        "Sob o Céu Estrelado",
        CopyrightPayload::default_rights(),
    )?;
    submit(&node, register, "registro")?;
    node.mine_pending()?;

    let summary = node.address_summary(&alice.address());
    println!(
        "   ✅ Registrada! Alice: {:.2} CPC, {} UTXO de copyright",
        summary.balance, summary.copyright_count
    );

    // 4. Bloqueio de autorização
    println!("\n4. Alice autoriza Bob (impressão e distribuição)...");
    let sovereignty = find_copyright(&node, &alice.address(), CopyrightType::Sovereignty);
    let fuel = find_fuel(&node, &alice.address());
    let rights = ["print", "distribute"]
        .into_iter()
        .map(str::to_string)
        .collect();
    let lock = alice.lock_authorization(&sovereignty, Some(&fuel), &bob.address(), rights)?;
    submit(&node, lock, "bloqueio de autorização")?;
    node.mine_pending()?;
    println!("   ✅ Instrução emitida para Bob");

    // 5. Ativação
    println!("\n5. Bob ativa a autorização...");
    let instruction = find_copyright(&node, &bob.address(), CopyrightType::Instruction);
    let activate = bob.activate_authorization(&instruction)?;
    submit(&node, activate, "ativação")?;
    node.mine_pending()?;

    let proof = node.verify_proof(&bob.address(), &work_hash);
    println!(
        "   ✅ Prova vigente em posse de Bob: {}",
        proof.is_some()
    );

    // 6. Sublicença
    println!("\n6. Bob sublicencia a impressão para Carol...");
    let proof = find_copyright(&node, &bob.address(), CopyrightType::Proof);
    let fuel = find_fuel(&node, &bob.address());
    let granted = ["print".to_string()].into_iter().collect();
    let sub = bob.sub_license(&proof, &fuel, &carol.address(), granted)?;
    submit(&node, sub, "sublicença")?;
    node.mine_pending()?;

    let carol_summary = node.address_summary(&carol.address());
    println!(
        "   ✅ Carol detém {} UTXO de copyright (sublicença)",
        carol_summary.copyright_count
    );

    // 7. Situação final
    println!("\n7. Situação final da cadeia:");
    let status = node.status();
    println!("   📏 Altura: {}", status.height);
    println!(
        "   🔎 UTXOs da obra: {}",
        node.copyright_by_work(&work_hash).len()
    );
    println!(
        "   ⛏️ Saldo do minerador (subsídio + recompensas + taxas): {:.4} CPC",
        node.address_summary(&miner.address()).balance
    );

    println!("\n🎉 Ciclo de vida completo: registro -> autorização -> ativação -> sublicença");
    Ok(())
}

fn submit(
    node: &Node,
    tx: cpc_core::Transaction,
    operation: &str,
) -> CliResult {
    let result = node.submit_transaction(tx);
    if !result.success {
        return Err(format!("{operation} rejeitado: {}", result.message).into());
    }
    Ok(())
}

fn find_fuel(node: &Node, address: &str) -> cpc_core::Utxo {
    node.address_summary(address)
        .utxos
        .into_iter()
        .filter(|utxo| utxo.kind == UtxoKind::Fuel)
        .max_by(|a, b| a.amount.total_cmp(&b.amount))
        .expect("endereço sem combustível")
}

fn find_copyright(node: &Node, address: &str, copyright_type: CopyrightType) -> cpc_core::Utxo {
    node.address_summary(address)
        .utxos
        .into_iter()
        .find(|utxo| {
            utxo.payload
                .as_ref()
                .is_some_and(|payload| payload.copyright_type == copyright_type)
        })
        .expect("UTXO de copyright não encontrada")
}
