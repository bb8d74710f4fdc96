//! Known-answer vectors.
//!
//! The identity, KDF and signature vectors are fixed outputs of the
//! reference deployment (password "Hello World", salt "00", ephemeral
//! preset, default group). The envelope vectors were sealed by an
//! independent implementation with a fixed session key.

use discrete_crypt::{
    Contact, Context, CreateOptions, Envelope, ExportOptions, GroupParams, KdfBackend, KdfConfig,
    KeyInput, SaltInput, Signature, Symmetric, decompose,
};
use num_bigint::BigUint;

const HELLO_PRIVATE: &str =
    "100393829911931591529540054103479785938321494005673330544449391501206113347665";

const HELLO_PUBLIC: &str = concat!(
    "9792532548672888919679971598764755635234283151150703798980374106719708930523787197950809201341611327",
    "2253621273811757411540178245109478752259809099205437206459868632251520694269053332518310903338836638",
    "8258967054364511924791230936162994441799393174462328138452995963359794559067052401106064676446149140",
    "1650629570430235318155478062115692022284527388620146028846954114180591724528464258149729353468930673",
    "6582221583695873202470110321664401655092441180257356093036239994641861706294875229290464591729850521",
    "4852822434175598397098613310094987763255685554011756285786491020221665846580644712301750701767223394",
    "9475908416135673653203604719986003915086490239894439010751811951964008742483464695076622467606051797",
    "2649664449261769907114668755997765116068500415810519874708613118583886984136151025239478845902472681",
    "2022545674342067414667845399676006168448374914787462159370004197462147612033356205470238970206950413",
    "832384381187006393689014778",
);

fn ctx() -> Context {
    Context::builder().with_backend(KdfBackend::Inline).build()
}

async fn hello_world(ctx: &Context) -> Contact {
    Contact::create(
        ctx,
        CreateOptions::new()
            .password("Hello World")
            .salt("00")
            .kdf_config(KdfConfig::ephemeral()),
    )
    .await
    .unwrap()
}

// ============================================================================
// Key Derivation
// ============================================================================

#[tokio::test]
async fn test_scrypt_hello_world_vector() {
    let out = ctx()
        .kdf()
        .derive(
            &KeyInput::from("Hello, World"),
            &SaltInput::from("00"),
            &KdfConfig::ephemeral(),
        )
        .await
        .unwrap();

    assert_eq!(
        hex::encode(&*out),
        "8a2d641456a541d54ed820b4d891399028b6df7df6736ce818717855751690ab"
    );
}

// ============================================================================
// Identity
// ============================================================================

#[tokio::test]
async fn test_hello_world_private_key() {
    let contact = hello_world(&ctx()).await;
    assert_eq!(contact.private_key().unwrap().to_str_radix(10), HELLO_PRIVATE);
}

#[tokio::test]
async fn test_hello_world_public_key() {
    let contact = hello_world(&ctx()).await;
    assert_eq!(contact.public_key().unwrap().to_str_radix(10), HELLO_PUBLIC);
}

#[tokio::test]
async fn test_hello_world_recomputes_from_export() {
    let ctx = ctx();
    let contact = hello_world(&ctx).await;

    let mut restored = Contact::import(&contact.export(&ExportOptions::default()).unwrap()).unwrap();
    restored.compute(&ctx, "Hello World").await.unwrap();
    assert_eq!(restored.private_key().unwrap().to_str_radix(10), HELLO_PRIVATE);
}

// ============================================================================
// Group Decomposition
// ============================================================================

#[test]
fn test_default_prime_small_factors() {
    let params = GroupParams::default();
    let (cofactor, factors) = decompose(&params.prime, None).unwrap();

    assert_eq!(factors, BigUint::from(420u32));
    assert_eq!(&cofactor * &factors + 1u32, params.prime);
    assert_eq!(cofactor.bits(), 3072);
}

// ============================================================================
// Signatures
// ============================================================================

const HELLO_S: &str = "43f0f6fe9de4ec28db8c73f80152c39c4a974734194b43333ff4c770798f6281fd280e63c1b713b50f2cbb82ce6f720dd2dd56977b72c05bd51fc39619a7bd3408";
const HELLO_E: &str = "eba1437ed7fc721a3aa192a40c6a00e7b3acbce6e81d167beffde789a89f0f8f";

#[tokio::test]
async fn test_hello_world_signature_vector() {
    let ctx = ctx();
    let contact = hello_world(&ctx).await;

    let signature = contact
        .sign(&ctx, &"Hello, World".to_string(), false)
        .await
        .unwrap();

    assert_eq!(signature.s, HELLO_S);
    assert_eq!(signature.e, HELLO_E);
}

#[test]
fn test_hello_world_signature_verifies_from_record() {
    let record = format!(r#"{{"salt":"00","public":"{HELLO_PUBLIC}"}}"#);
    let contact = Contact::import(&record).unwrap();

    let signature: Signature<String> =
        Signature::from_json(&format!(r#"{{"s":"{HELLO_S}","e":"{HELLO_E}","data":"Hello, World"}}"#))
            .unwrap();

    assert_eq!(contact.verify(&signature, None).unwrap(), "Hello, World");
}

// ============================================================================
// Envelopes
// ============================================================================

#[tokio::test]
async fn test_symmetric_envelope_vector() {
    let envelope = Envelope::from_json(
        r#"{"payload":"54c4d533435c0cd19a40d67777d4e614b4e6bdf1fe53ea7dd2163c","key":"5c38e91840a8d7de7028997deedb50c5f86406b78bc98067bb124c612d6f6e91","hmac":"981ac53526acbf2cc159e9c24b56550d8faaaf583bcda8b3fd44ca77485b1d40"}"#,
    )
    .unwrap();

    let opened = Symmetric::decrypt_raw(
        &ctx(),
        Some(&KeyInput::from("correct horse")),
        &envelope,
        Some(KdfConfig::ephemeral()),
    )
    .await
    .unwrap();

    assert_eq!(opened.as_slice(), br#"{"greeting":"Hello, World"}"#);
}

#[tokio::test]
async fn test_exchange_envelope_vector() {
    let ctx = ctx();
    let bob = Contact::create(
        &ctx,
        CreateOptions::new()
            .password("bob")
            .salt("01")
            .kdf_config(KdfConfig::ephemeral()),
    )
    .await
    .unwrap();

    let envelope = Envelope {
        payload: "bb47cc37ef6f76ce166ec46b".into(),
        key: "65fa870a64bc4320ebd1b0e510dcc11d61f1a5ba37b59669bb29e0939fe44703".into(),
        hmac: "86d181bfbbcc7cf9d4d329049e4c4947ae7b95e8c3900d06c5fdce32168df066".into(),
        public: Some(concat!(
            "5f12ec33a0120936fae7adb4e866712614c8218ce04a484277f8e5e3242c56f662b5827601162e77eb5b2524c6c1a5815dec1a7e9e59673f2f9b440fe6ad02bd5c",
            "52426e6b43eda1c9cc01ea3830a11cdc3572047431562c2e7c0ee855228acdae540fcba43052f240def385b1d10dc81e73dad28686b0d3645372af56f6c5999ab8",
            "2df4f400a3896cfd2890633abb1c5fefeaf923584f7f4a64d6fce90bf7fdec97ecbd270bb4134bc3c0a4b9a78c6015e22673be0f2cedce75fdf019a7fb5c878045",
            "dc8874532c2fc3d3a9db4e91b2b226876fe1c2c7c1f74b4e5e622986c19af31ff08d3ee37a2e36f37f8dc8d01116951ecf4e23ff77a8125615d92b8f5b1c2f6b07",
            "47c02b546b7acf8363d146bf8f88bc0d5548e84d7ea2a0c4dce6b60161939ed02fd631ed7fa81ab8890fb0cd30dcf9f5ad547d1bd64f3a4eb05b6bedbd3a813330",
            "f762283a3b9ed752a6f1436d5ef644c933af24c3222843e430f36f8d6f4040bb05fb4d359cf0fffa1b59f4e9ec1fe110b3acd963a875a07d6864027a",
        )
        .into()),
    };

    let opened: String = ctx.open(&bob, &envelope).await.unwrap();
    assert_eq!(opened, "Hello, Bob");
}

/// Shared value with an odd number of hex digits (alice salt "0a").
#[tokio::test]
async fn test_exchange_envelope_vector_odd_length_secret() {
    let ctx = ctx();
    let fast = |password: &str, salt: &str| {
        CreateOptions::new()
            .password(password)
            .salt(salt)
            .kdf_config(KdfConfig::ephemeral())
    };
    let bob = Contact::create(&ctx, fast("bob", "01")).await.unwrap();
    let alice = Contact::create(&ctx, fast("alice", "0a")).await.unwrap();

    let shared = ctx.shared_secret(&alice, &bob).unwrap();
    assert_eq!(shared.len() % 2, 1);

    let envelope = Envelope {
        payload: "2c11bbfa1261e46f83e3202584eddc15".into(),
        key: "5b1b4c9d909ba022aef1c2d863d93a8686fab3105b210e92b86ac0e81356d269".into(),
        hmac: "ee3f62cde2675bf356439c6c49b11960001b121844582ff20a285dbbeb451679".into(),
        public: Some(concat!(
            "a0f1a33a856cf4b670c822d4ecd5d87fe0106afe022b8bb2e22440e98e6368eb318e43c4dbe8a0fcd2a47b541c2d3b90d1ea4303c4b25a38ee52383ac80c0e97",
            "13656122d0b6c13d4184f16380932ce81ccdffdceef459711dacd62200ee03da2a051050d8c0dacb52fd8c8c8f08c87fe799287a9f500cea388289db36787e9a",
            "157022b5e40dfd0599b8faabf0fb47505ecd2d678df4186032b4cfcdd2699bb3a389695e47a8116f1996dcecccd4828b2004e9015ca18ced5578518d9dc5a855",
            "9feadabebdd7be424dc190ea9e7c2006d1654bf5c8ee6becc5e0edf6e38ee41755eaf9a352b8cb08c3d57f97c475cf63dec4c59a51e486aff092b8378057bdef",
            "0286b159db48eb0c6143683af52d2c7f7f54a2184166702f3b4b1a865665e4ad8e609b7d503db9de838d19798ffbd7caea283fdf10279c428c5d847ea4029e86",
            "4752ae1cd32b2d89a4ad17446e32ad1271e961f3a7805924d276163244d7d9996408fce416c877a26e8c58e1ecd82553cb62dc2be1946bcbbffce6ee0628f530",
            "b8",
        )
        .into()),
    };
    assert_eq!(envelope.public.as_deref(), Some(alice.public_key().unwrap().to_str_radix(16).as_str()));

    let opened: String = ctx.open(&bob, &envelope).await.unwrap();
    assert_eq!(opened, "Hello, odd Bob");
}
