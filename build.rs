fn main() {
    // Embedded by `sqlx::migrate!`; new files must trigger a rebuild.
    println!("cargo:rerun-if-changed=migrations");
}
