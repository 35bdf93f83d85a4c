use dotenvy::dotenv;

// endpoint vars and the value used when neither the env nor .env provides one
const ENDPOINTS: [(&str, &str); 2] = [
  ("GRAPHQL_URL", "http://localhost:4000/graphql"),
  ("WSS_URL", "ws://localhost:4000/ws"),
];

fn main() {
  // Tell Cargo that if the env file changes, to rerun this build script.
  println!("cargo::rerun-if-changed=.env");

  // a missing .env is fine, the defaults below cover local development
  let _ = dotenv();

  for (key, default) in ENDPOINTS {
    println!("cargo::rerun-if-env-changed={}", key);
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    println!("cargo::rustc-env={}={}", key, value);
  }
}
